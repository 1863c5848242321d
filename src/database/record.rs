//! Persisted setting record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{self, TypeTag};
use crate::error::DecodeError;

/// One row of the settings collection.
///
/// `kind` stays a raw string so rows written with an unknown tag can still
/// be read and reported instead of failing the whole scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingRecord {
    /// Top-level setting key (unique)
    pub key: String,

    /// Type tag name
    #[serde(rename = "type")]
    pub kind: String,

    /// Encoded value text
    pub value: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl SettingRecord {
    /// Encode a typed value into a fresh record stamped with `now`.
    pub fn encode(key: impl Into<String>, value: &Value, tag: TypeTag, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            kind: tag.as_str().to_string(),
            value: codec::encode(value, tag),
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode the stored text according to the stored tag.
    pub fn decode(&self) -> Result<Value, DecodeError> {
        codec::decode_tagged(&self.value, &self.kind)
    }
}

/// Cheap summary of the whole collection, used to detect outside writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreFingerprint {
    /// Number of rows
    pub count: u64,
    /// Most recent `updated_at` across all rows
    pub last_updated: Option<DateTime<Utc>>,
}
