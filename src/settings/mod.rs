//! Settings module - the typed settings store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = SettingsStore::new(records, SettingsOptions::default())?;
//!
//! store.set("mail.host", "mx.example.org", None).await?;
//! let port = store.get_or("mail.port", 25).await?;
//! ```

mod options;
pub mod path;
mod store;
mod template;

pub use options::{DEFAULT_CACHE_KEY, DEFAULT_PAGE_SIZE, SettingsOptions};
pub use store::SettingsStore;
pub use template::interpolate;

/// Decoded settings keyed by top-level key.
pub type SettingsMap = serde_json::Map<String, serde_json::Value>;
