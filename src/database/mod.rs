//! Database module exports.

mod memory;
mod mongo;
mod mongo_store;
mod record;
mod store;

pub use memory::MemoryRecordStore;
pub use mongo::Database;
pub use mongo_store::MongoRecordStore;
pub use record::{SettingRecord, StoreFingerprint};
pub use store::{RecordStore, ScanPage};
