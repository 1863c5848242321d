//! Durable record store contract.

use std::future::Future;

use crate::error::Result;

use super::{SettingRecord, StoreFingerprint};

/// One page of a key-ordered scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<SettingRecord>,
    /// Rows covered by the page, readable or not
    pub scanned: usize,
    /// Key of the last row covered, the cursor for the next page
    pub last_key: Option<String>,
}

impl ScanPage {
    /// Page where every row was readable.
    pub fn from_records(records: Vec<SettingRecord>) -> Self {
        Self {
            scanned: records.len(),
            last_key: records.last().map(|record| record.key.clone()),
            records,
        }
    }
}

/// Persistence for setting records, one row per top-level key.
///
/// Implementations own their connection lifecycle, timeouts and retries.
pub trait RecordStore: Send + Sync {
    /// Point lookup by key.
    fn find(&self, key: &str) -> impl Future<Output = Result<Option<SettingRecord>>> + Send;

    /// Whether a row exists for `key`.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Insert a new row.
    fn insert(&self, record: &SettingRecord) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite type, value and `updated_at` of an existing row.
    /// `created_at` is left untouched.
    fn update(&self, record: &SettingRecord) -> impl Future<Output = Result<()>> + Send;

    /// Insert or update depending on whether the key already exists.
    fn upsert(&self, record: &SettingRecord) -> impl Future<Output = Result<()>> + Send {
        async move {
            if self.exists(&record.key).await? {
                self.update(record).await
            } else {
                self.insert(record).await
            }
        }
    }

    /// Delete one row. Returns `true` if a row was removed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Delete every row. Returns the number removed.
    fn delete_all(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Up to `limit` rows ordered by key, strictly after `after`.
    ///
    /// Rows that cannot be read as records are left out of
    /// [`ScanPage::records`] but still count towards the page.
    fn scan_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<ScanPage>> + Send;

    /// Row count and latest update time.
    fn fingerprint(&self) -> impl Future<Output = Result<StoreFingerprint>> + Send;
}
