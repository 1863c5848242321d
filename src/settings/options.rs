//! Settings store options.

use std::time::Duration;

use crate::cache::CacheConfig;
use crate::error::{Result, SettingsError};

/// Default number of records read per scan page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default cache key for the snapshot blob.
pub const DEFAULT_CACHE_KEY: &str = "settings";

/// Tunables for a [`SettingsStore`](super::SettingsStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsOptions {
    /// Cache key the whole snapshot is stored under.
    pub cache_key: String,

    /// How long a cached snapshot lives. `None` keeps it until overwritten.
    pub cache_duration: Option<Duration>,

    /// Records per scan page while loading.
    pub page_size: usize,

    /// Compare cached snapshots against the store fingerprint on load.
    pub track_changes: bool,
}

impl Default for SettingsOptions {
    fn default() -> Self {
        Self {
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_duration: None,
            page_size: DEFAULT_PAGE_SIZE,
            track_changes: false,
        }
    }
}

impl SettingsOptions {
    #[must_use]
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    #[must_use]
    pub fn cache_duration(mut self, duration: Option<Duration>) -> Self {
        self.cache_duration = duration;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn track_changes(mut self, enabled: bool) -> Self {
        self.track_changes = enabled;
        self
    }

    /// Cache config matching these options.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::snapshot(self.cache_duration)
    }

    /// Check the options before a store is built.
    ///
    /// # Errors
    /// Configuration error for a zero page size, or for a blank cache key
    /// when a cache is in use.
    pub fn validate(&self, with_cache: bool) -> Result<()> {
        if self.page_size == 0 {
            return Err(SettingsError::config("page size must be at least 1"));
        }
        if with_cache && self.cache_key.trim().is_empty() {
            return Err(SettingsError::config(
                "a cache key must be set when using a cache",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = SettingsOptions::default();
        assert_eq!(options.page_size, 100);
        assert_eq!(options.cache_key, "settings");
        assert!(options.validate(true).is_ok());
    }

    #[test]
    fn test_blank_cache_key_needs_no_cache() {
        let options = SettingsOptions::default().cache_key("  ");
        assert!(options.validate(false).is_ok());
        assert!(matches!(
            options.validate(true),
            Err(SettingsError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_page_size() {
        let options = SettingsOptions::default().page_size(0);
        assert!(options.validate(false).is_err());
    }

    #[test]
    fn test_cache_config_uses_duration() {
        let options = SettingsOptions::default().cache_duration(Some(Duration::from_secs(30)));
        assert_eq!(options.cache_config().ttl, Some(Duration::from_secs(30)));
    }
}
