//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    /// After this duration, entries are automatically evicted.
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    /// Config for whole-snapshot blobs: a handful of keys, optional duration.
    ///
    /// `None` keeps entries until they are overwritten or deleted.
    pub fn snapshot(duration: Option<Duration>) -> Self {
        Self {
            max_capacity: 16,
            ttl: duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_config() {
        assert_eq!(CacheConfig::snapshot(None).ttl, None);
        let config = CacheConfig::snapshot(Some(Duration::from_secs(60)));
        assert_eq!(config.ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.max_capacity, 16);
    }
}
