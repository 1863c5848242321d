//! Settings collection in MongoDB.
//!
//! One document per top-level key:
//! `{ key, type, value, created_at, updated_at }` with timestamps stored as
//! epoch milliseconds so they sort numerically.

use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::options::{CountOptions, FindOneOptions, FindOptions, IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, warn};

use crate::error::Result;

use super::{RecordStore, ScanPage, SettingRecord, StoreFingerprint};

/// Record store backed by a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoRecordStore {
    collection: Collection<SettingRecord>,
}

impl MongoRecordStore {
    pub fn new(collection: Collection<SettingRecord>) -> Self {
        Self { collection }
    }

    /// Create the unique index on `key`.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        debug!("Ensured unique key index on {}", self.collection.name());
        Ok(())
    }

    fn by_key(key: &str) -> Document {
        doc! { "key": key }
    }
}

/// Convert raw documents one by one; unreadable rows are logged and left out.
fn read_page(docs: Vec<Document>) -> ScanPage {
    let mut page = ScanPage {
        scanned: docs.len(),
        ..ScanPage::default()
    };

    for doc in docs {
        let key = doc.get_str("key").map(str::to_string).ok();
        match bson::from_document::<SettingRecord>(doc) {
            Ok(record) => page.records.push(record),
            Err(e) => warn!("Skipping unreadable setting {:?}: {}", key, e),
        }
        if key.is_some() {
            page.last_key = key;
        }
    }

    page
}

impl RecordStore for MongoRecordStore {
    async fn find(&self, key: &str) -> Result<Option<SettingRecord>> {
        Ok(self.collection.find_one(Self::by_key(key)).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let options = CountOptions::builder().limit(1).build();
        let count = self
            .collection
            .count_documents(Self::by_key(key))
            .with_options(options)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, record: &SettingRecord) -> Result<()> {
        self.collection.insert_one(record).await?;
        debug!("Inserted setting {}", record.key);
        Ok(())
    }

    async fn update(&self, record: &SettingRecord) -> Result<()> {
        let update = doc! {
            "$set": {
                "type": &record.kind,
                "value": &record.value,
                "updated_at": record.updated_at.timestamp_millis(),
            }
        };

        self.collection
            .update_one(Self::by_key(&record.key), update)
            .await?;
        debug!("Updated setting {}", record.key);
        Ok(())
    }

    /// Single-statement upsert; `created_at` is only written on insert.
    async fn upsert(&self, record: &SettingRecord) -> Result<()> {
        let update = doc! {
            "$set": {
                "type": &record.kind,
                "value": &record.value,
                "updated_at": record.updated_at.timestamp_millis(),
            },
            "$setOnInsert": {
                "created_at": record.created_at.timestamp_millis(),
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(Self::by_key(&record.key), update)
            .with_options(options)
            .await?;
        debug!("Upserted setting {}", record.key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = self.collection.delete_one(Self::by_key(key)).await?;
        debug!("Deleted setting {}: {}", key, result.deleted_count > 0);
        Ok(result.deleted_count > 0)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        debug!("Deleted {} settings", result.deleted_count);
        Ok(result.deleted_count)
    }

    /// Scans raw documents so one malformed row cannot fail the page.
    /// Rows without a string key are never settings and are not scanned.
    async fn scan_page(&self, after: Option<&str>, limit: usize) -> Result<ScanPage> {
        let filter = match after {
            Some(key) => doc! { "key": { "$type": "string", "$gt": key } },
            None => doc! { "key": { "$type": "string" } },
        };
        let options = FindOptions::builder()
            .sort(doc! { "key": 1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let raw_coll: Collection<Document> = self.collection.clone_with_type();
        let cursor = raw_coll.find(filter).with_options(options).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(read_page(docs))
    }

    async fn fingerprint(&self) -> Result<StoreFingerprint> {
        let count = self.collection.count_documents(doc! {}).await?;
        let options = FindOneOptions::builder()
            .sort(doc! { "updated_at": -1 })
            .build();
        let latest = self
            .collection
            .find_one(doc! {})
            .with_options(options)
            .await?;

        Ok(StoreFingerprint {
            count,
            last_updated: latest.map(|record| record.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_page_skips_malformed_rows() {
        let docs = vec![
            doc! {
                "key": "a",
                "type": "integer",
                "value": "1",
                "created_at": 1_000_i64,
                "updated_at": 2_000_i64,
            },
            doc! { "key": "b", "type": "string", "value": 5 },
            doc! { "key": "c", "value": "no type" },
        ];

        let page = read_page(docs);
        assert_eq!(page.scanned, 3);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].key, "a");
        assert_eq!(page.records[0].updated_at.timestamp_millis(), 2_000);
        // the cursor moves past the bad rows too
        assert_eq!(page.last_key.as_deref(), Some("c"));
    }

    #[test]
    fn test_read_empty_page() {
        let page = read_page(Vec::new());
        assert_eq!(page.scanned, 0);
        assert!(page.last_key.is_none());
    }
}
