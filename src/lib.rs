//! Appsettings - typed, cache-backed application settings.
//!
//! Settings live one record per top-level key in a durable store, with the
//! native type of each value preserved through a type tag. Reads come from
//! an in-process snapshot that is loaded lazily and kept consistent by
//! write-through on every mutation.
//!
//! ## Architecture
//!
//! - `codec` - Type tags and text encoding of values
//! - `database` - Record store contract, MongoDB and in-memory stores
//! - `cache` - Snapshot cache contract and Moka-backed caches
//! - `settings` - The settings store and dotted-path access
//! - `config` - Environment configuration
//! - `error` - Error types

pub mod cache;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod settings;

pub use codec::TypeTag;
pub use error::{DecodeError, Result, SettingsError};
pub use settings::{SettingsMap, SettingsOptions, SettingsStore};
