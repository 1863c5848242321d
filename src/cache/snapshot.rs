//! External snapshot cache contract.
//!
//! The whole settings snapshot is cached as one blob under a single key,
//! never per setting.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::database::StoreFingerprint;
use crate::settings::SettingsMap;

use super::TypedCache;

/// Cached settings blob.
#[derive(Debug, Clone, Default)]
pub struct CachedSnapshot {
    /// Decoded settings keyed by top-level key
    pub settings: Arc<SettingsMap>,
    /// Store fingerprint observed when the blob was built, if tracked
    pub fingerprint: Option<StoreFingerprint>,
}

/// Cache that holds settings snapshots.
///
/// Access is advisory: there is no locking, and concurrent populates simply
/// compute the same snapshot and overwrite each other.
pub trait SnapshotCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedSnapshot>;

    fn set(&self, key: &str, snapshot: CachedSnapshot);

    fn delete(&self, key: &str);

    /// Return the cached blob, or compute, store and return a fresh one.
    fn get_or_populate<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
    ) -> impl Future<Output = Result<CachedSnapshot, E>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<CachedSnapshot, E>> + Send,
        E: Send,
    {
        async move {
            if let Some(hit) = self.get(key) {
                debug!("Settings cache hit for {}", key);
                return Ok(hit);
            }

            debug!("Settings cache miss for {}", key);
            let fresh = compute().await?;
            self.set(key, fresh.clone());
            Ok(fresh)
        }
    }
}

impl SnapshotCache for TypedCache<String, CachedSnapshot> {
    fn get(&self, key: &str) -> Option<CachedSnapshot> {
        TypedCache::get(self, key)
    }

    fn set(&self, key: &str, snapshot: CachedSnapshot) {
        self.insert(key.to_string(), snapshot);
    }

    fn delete(&self, key: &str) {
        self.invalidate(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use serde_json::json;

    fn snapshot(value: i64) -> CachedSnapshot {
        let mut settings = SettingsMap::new();
        settings.insert("a".to_string(), json!(value));
        CachedSnapshot {
            settings: Arc::new(settings),
            fingerprint: None,
        }
    }

    #[tokio::test]
    async fn test_get_or_populate_computes_once() {
        let cache: TypedCache<String, CachedSnapshot> =
            TypedCache::new("settings", CacheConfig::snapshot(None));

        let first = cache
            .get_or_populate("settings", || async { Ok::<_, ()>(snapshot(1)) })
            .await
            .unwrap();
        assert_eq!(first.settings["a"], json!(1));

        let second = cache
            .get_or_populate("settings", || async { Ok::<_, ()>(snapshot(2)) })
            .await
            .unwrap();
        assert_eq!(second.settings["a"], json!(1));
    }

    #[tokio::test]
    async fn test_failed_populate_leaves_cache_empty() {
        let cache: TypedCache<String, CachedSnapshot> =
            TypedCache::new("settings", CacheConfig::snapshot(None));

        let result = cache
            .get_or_populate("settings", || async { Err::<CachedSnapshot, _>("boom") })
            .await;
        assert_eq!(result.unwrap_err(), "boom");
        assert!(SnapshotCache::get(&cache, "settings").is_none());

        cache.set("settings", snapshot(3));
        SnapshotCache::delete(&cache, "settings");
        assert!(SnapshotCache::get(&cache, "settings").is_none());
    }
}
