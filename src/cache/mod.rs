//! Cache module - snapshot caching built on Moka.
//!
//! ## Architecture
//!
//! - `SnapshotCache` - Contract the settings store uses for its external cache
//! - `TypedCache` - Moka-backed typed cache, implements `SnapshotCache`
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache: TypedCache<String, CachedSnapshot> =
//!     TypedCache::new("settings", CacheConfig::snapshot(Some(Duration::from_secs(600))));
//! let store = SettingsStore::with_cache(records, cache, options)?;
//! ```

mod config;
mod snapshot;
mod typed;

pub use config::CacheConfig;
pub use snapshot::{CachedSnapshot, SnapshotCache};
pub use typed::TypedCache;
