//! In-process record store.
//!
//! Useful for embedding without a database and as the store behind tests.
//! Cloning shares the same rows.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::Result;

use super::{RecordStore, ScanPage, SettingRecord, StoreFingerprint};

/// Record store backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    rows: Arc<RwLock<BTreeMap<String, SettingRecord>>>,
    pages_scanned: Arc<AtomicU64>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// How many scan pages have been served, for monitoring loads.
    pub fn pages_scanned(&self) -> u64 {
        self.pages_scanned.load(Ordering::Relaxed)
    }
}

impl RecordStore for MemoryRecordStore {
    async fn find(&self, key: &str) -> Result<Option<SettingRecord>> {
        Ok(self.rows.read().get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.rows.read().contains_key(key))
    }

    /// Replaces an existing row with the same key.
    async fn insert(&self, record: &SettingRecord) -> Result<()> {
        self.rows.write().insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &SettingRecord) -> Result<()> {
        if let Some(row) = self.rows.write().get_mut(&record.key) {
            row.kind.clone_from(&record.kind);
            row.value.clone_from(&record.value);
            row.updated_at = record.updated_at;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.rows.write().remove(key).is_some())
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut rows = self.rows.write();
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }

    async fn scan_page(&self, after: Option<&str>, limit: usize) -> Result<ScanPage> {
        self.pages_scanned.fetch_add(1, Ordering::Relaxed);

        let rows = self.rows.read();
        let range = match after {
            Some(key) => rows.range::<str, _>((Bound::Excluded(key), Bound::Unbounded)),
            None => rows.range::<str, _>(..),
        };

        let records = range.take(limit).map(|(_, record)| record.clone()).collect();
        Ok(ScanPage::from_records(records))
    }

    async fn fingerprint(&self) -> Result<StoreFingerprint> {
        let rows = self.rows.read();
        Ok(StoreFingerprint {
            count: rows.len() as u64,
            last_updated: rows.values().map(|r| r.updated_at).max(),
        })
    }
}
