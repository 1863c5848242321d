//! Settings store - typed settings over a record store and snapshot cache.
//!
//! Reads are served from an in-process snapshot of every setting. The
//! snapshot is loaded lazily on first access, from the external cache when
//! one is configured, otherwise by a paged scan of the record store.
//!
//! Loads and mutators are serialized per store. Every mutator (`set`,
//! `delete`, `flush`) persists first and then applies its single-key change
//! to the held snapshot before writing it through to the cache. With change
//! tracking a mutator instead rebuilds the snapshot from the store, so a
//! cached fingerprint always describes exactly what was scanned. `refresh`
//! is the only operation that drops the snapshot and the cached blob.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CachedSnapshot, SnapshotCache, TypedCache};
use crate::codec::{self, TypeTag};
use crate::database::{RecordStore, SettingRecord, StoreFingerprint};
use crate::error::{DecodeError, Result};

use super::path;
use super::{SettingsMap, SettingsOptions};

/// Application settings backed by a [`RecordStore`] and an optional
/// [`SnapshotCache`].
///
/// Construct one per application and share it (`Arc<SettingsStore<_>>`);
/// all operations take `&self`.
pub struct SettingsStore<S, C = TypedCache<String, CachedSnapshot>> {
    records: S,
    cache: Option<C>,
    options: SettingsOptions,
    /// Held snapshot with the fingerprint it was built from
    snapshot: RwLock<Option<CachedSnapshot>>,
    writes: Mutex<()>,
}

/// Single-key change a mutator applies to the held snapshot.
#[derive(Debug)]
enum Change {
    Put(String, Value),
    Remove(String),
    Clear,
}

impl Change {
    fn apply(self, settings: &mut SettingsMap) {
        match self {
            Self::Put(key, value) => {
                settings.insert(key, value);
            }
            Self::Remove(key) => {
                settings.remove(&key);
            }
            Self::Clear => settings.clear(),
        }
    }
}

impl<S: RecordStore> SettingsStore<S> {
    /// Store without an external cache.
    ///
    /// # Errors
    /// Configuration error when `options` are invalid.
    pub fn new(records: S, options: SettingsOptions) -> Result<Self> {
        Self::build(records, None, options)
    }
}

impl<S: RecordStore, C: SnapshotCache> SettingsStore<S, C> {
    /// Store that keeps its snapshot in `cache` under `options.cache_key`.
    ///
    /// # Errors
    /// Configuration error when `options` are invalid, including a blank
    /// cache key.
    pub fn with_cache(records: S, cache: C, options: SettingsOptions) -> Result<Self> {
        Self::build(records, Some(cache), options)
    }

    fn build(records: S, cache: Option<C>, options: SettingsOptions) -> Result<Self> {
        options.validate(cache.is_some())?;
        Ok(Self {
            records,
            cache,
            options,
            snapshot: RwLock::new(None),
            writes: Mutex::new(()),
        })
    }

    /// The underlying record store.
    pub fn records(&self) -> &S {
        &self.records
    }

    pub fn options(&self) -> &SettingsOptions {
        &self.options
    }

    /// Whether a snapshot is currently held in-process.
    pub fn is_loaded(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// All settings, keyed by top-level key.
    pub async fn get_all(&self) -> Result<Arc<SettingsMap>> {
        if let Some(settings) = self.held() {
            return Ok(settings);
        }

        let _writes = self.writes.lock().await;
        self.ensure_loaded().await
    }

    /// Resolve a dotted path.
    ///
    /// Returns `default` when the path is absent; with `save_default` the
    /// default is also persisted under `path`.
    pub async fn get(
        &self,
        path: &str,
        default: Option<Value>,
        save_default: bool,
    ) -> Result<Option<Value>> {
        let settings = self.get_all().await?;
        if let Some(value) = path::lookup(&settings, path) {
            return Ok(Some(value.clone()));
        }

        if save_default && let Some(value) = &default {
            debug!("Saving default for setting {}", path);
            self.set(path, value.clone(), None).await?;
        }

        Ok(default)
    }

    /// Resolve a dotted path, falling back to `default`.
    pub async fn get_or(&self, path: &str, default: impl Into<Value>) -> Result<Value> {
        let default = default.into();
        Ok(self.get(path, None, false).await?.unwrap_or(default))
    }

    /// Resolve a dotted path and deserialize it into `T`.
    ///
    /// # Errors
    /// Decode error when the stored value does not fit `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path, None, false).await? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(DecodeError::from)?,
            )),
            None => Ok(None),
        }
    }

    /// Persist `value` under `path`.
    ///
    /// A `null` value deletes. `kind` overrides type detection; for nested
    /// paths it applies to the written leaf while the top-level record is
    /// re-persisted whole as `array`.
    pub async fn set(
        &self,
        path: &str,
        value: impl Into<Value>,
        kind: Option<TypeTag>,
    ) -> Result<()> {
        let value = value.into();
        if value.is_null() {
            return self.delete(path).await;
        }

        let _writes = self.writes.lock().await;
        let current = self.base_for_write().await?;
        let (key, segments) = path::target(&current, path);
        let tag = kind.unwrap_or_else(|| codec::detect_type(&value));

        let record = if segments.is_empty() {
            SettingRecord::encode(key, &value, tag, Utc::now())
        } else {
            let leaf = codec::normalize(&value, tag)?;
            let mut root = current.get(key).cloned().unwrap_or(Value::Null);
            path::write(&mut root, &segments, leaf, path)?;
            SettingRecord::encode(key, &root, TypeTag::Array, Utc::now())
        };
        let decoded = record.decode()?;

        self.records.upsert(&record).await?;
        debug!("Set setting {} ({})", path, record.kind);

        self.write_through(Change::Put(key.to_string(), decoded)).await
    }

    /// Remove the setting at `path`.
    ///
    /// A top-level key drops its record. A nested path removes only that
    /// field and re-persists the parent. Deleting something absent is a no-op.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let _writes = self.writes.lock().await;
        let current = self.base_for_write().await?;
        let (key, segments) = path::target(&current, path);

        if segments.is_empty() {
            let removed = self.records.delete(key).await?;
            if !removed && !current.contains_key(key) {
                debug!("Setting {} already absent", path);
                return Ok(());
            }
            debug!("Deleted setting {}", path);
            return self.write_through(Change::Remove(key.to_string())).await;
        }

        let Some(mut root) = current.get(key).cloned() else {
            debug!("Setting {} already absent", path);
            return Ok(());
        };
        if !path::remove(&mut root, &segments) {
            debug!("Setting {} already absent", path);
            return Ok(());
        }

        let record = SettingRecord::encode(key, &root, TypeTag::Array, Utc::now());
        let decoded = record.decode()?;
        self.records.upsert(&record).await?;
        debug!("Deleted nested setting {}", path);

        self.write_through(Change::Put(key.to_string(), decoded)).await
    }

    /// Delete every setting.
    pub async fn flush(&self) -> Result<()> {
        let _writes = self.writes.lock().await;
        let removed = self.records.delete_all().await?;
        info!("Flushed {} settings", removed);
        self.write_through(Change::Clear).await
    }

    /// Drop the held snapshot and the cached blob so the next read reloads
    /// from the record store.
    pub fn refresh(&self) {
        *self.snapshot.write() = None;
        self.drop_cached();
        debug!("Settings snapshot invalidated");
    }

    fn held(&self) -> Option<Arc<SettingsMap>> {
        self.snapshot
            .read()
            .as_ref()
            .map(|held| Arc::clone(&held.settings))
    }

    fn drop_cached(&self) {
        if let Some(cache) = &self.cache {
            cache.delete(&self.options.cache_key);
        }
    }

    /// Hold `snapshot` and write it to the cache.
    fn install(&self, snapshot: CachedSnapshot) -> Arc<SettingsMap> {
        let settings = Arc::clone(&snapshot.settings);
        if let Some(cache) = &self.cache {
            cache.set(&self.options.cache_key, snapshot.clone());
        }
        *self.snapshot.write() = Some(snapshot);
        settings
    }

    /// Load the snapshot unless one is held. Callers hold `writes`.
    async fn ensure_loaded(&self) -> Result<Arc<SettingsMap>> {
        // loaded while waiting for the lock
        if let Some(settings) = self.held() {
            return Ok(settings);
        }

        let snapshot = match &self.cache {
            Some(cache) => self.load_cached(cache).await?,
            None => self.build_snapshot(self.current_fingerprint().await?).await?,
        };

        let settings = Arc::clone(&snapshot.settings);
        *self.snapshot.write() = Some(snapshot);
        Ok(settings)
    }

    /// Snapshot a mutator computes its change against. Callers hold `writes`.
    ///
    /// With change tracking a snapshot built before an outside write is
    /// replaced first, so nested writes never patch a stale parent.
    async fn base_for_write(&self) -> Result<Arc<SettingsMap>> {
        let settings = self.ensure_loaded().await?;
        if !self.options.track_changes {
            return Ok(settings);
        }

        let current = self.current_fingerprint().await?;
        let built_with = self
            .snapshot
            .read()
            .as_ref()
            .and_then(|held| held.fingerprint);
        if built_with == current {
            return Ok(settings);
        }

        debug!("Settings changed outside this store, reloading before write");
        let fresh = self.build_snapshot(current).await?;
        Ok(self.install(fresh))
    }

    /// Bring the held snapshot and the cached blob in line with a write
    /// that has already been persisted.
    async fn write_through(&self, change: Change) -> Result<()> {
        if self.options.track_changes {
            return self.rebuild().await;
        }

        let patched = {
            let mut held = self.snapshot.write();
            held.as_mut().map(|snapshot| {
                change.apply(Arc::make_mut(&mut snapshot.settings));
                snapshot.clone()
            })
        };

        match (&self.cache, patched) {
            (Some(cache), Some(snapshot)) => cache.set(&self.options.cache_key, snapshot),
            // nothing held to patch, make the next read reload
            (Some(cache), None) => cache.delete(&self.options.cache_key),
            (None, _) => {}
        }
        Ok(())
    }

    /// Rebuild the snapshot from the store after a write.
    async fn rebuild(&self) -> Result<()> {
        let fresh = match self.current_fingerprint().await {
            Ok(fingerprint) => self.build_snapshot(fingerprint).await,
            Err(e) => Err(e),
        };

        match fresh {
            Ok(fresh) => {
                self.install(fresh);
                Ok(())
            }
            Err(e) => {
                // the write is persisted but neither copy reflects it
                *self.snapshot.write() = None;
                self.drop_cached();
                Err(e)
            }
        }
    }

    async fn load_cached(&self, cache: &C) -> Result<CachedSnapshot> {
        let key = &self.options.cache_key;
        let current = self.current_fingerprint().await?;

        let cached = cache
            .get_or_populate(key, || self.build_snapshot(current))
            .await?;

        if current.is_some() && cached.fingerprint != current {
            debug!("Cached settings are stale, reloading");
            let fresh = self.build_snapshot(current).await?;
            cache.set(key, fresh.clone());
            return Ok(fresh);
        }

        Ok(cached)
    }

    async fn current_fingerprint(&self) -> Result<Option<StoreFingerprint>> {
        if !self.options.track_changes {
            return Ok(None);
        }
        self.records.fingerprint().await.map(Some)
    }

    async fn build_snapshot(
        &self,
        fingerprint: Option<StoreFingerprint>,
    ) -> Result<CachedSnapshot> {
        Ok(CachedSnapshot {
            settings: Arc::new(self.fetch_settings().await?),
            fingerprint,
        })
    }

    /// Decode every record, page by page. Undecodable records are skipped.
    async fn fetch_settings(&self) -> Result<SettingsMap> {
        let page_size = self.options.page_size;
        let mut settings = SettingsMap::new();
        let mut after: Option<String> = None;

        loop {
            let page = self.records.scan_page(after.as_deref(), page_size).await?;

            for record in page.records {
                match record.decode() {
                    Ok(value) => {
                        settings.insert(record.key, value);
                    }
                    Err(e) => warn!("Skipping setting {}: {}", record.key, e),
                }
            }

            if page.scanned < page_size || page.last_key.is_none() {
                break;
            }
            after = page.last_key;
        }

        debug!("Loaded {} settings from store", settings.len());
        Ok(settings)
    }
}

impl<S, C> std::fmt::Debug for SettingsStore<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("options", &self.options)
            .field("cached", &self.cache.is_some())
            .field("loaded", &self.snapshot.read().is_some())
            .finish()
    }
}
