//! Configuration module.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::time::Duration;

use crate::error::{Result, SettingsError};
use crate::settings::{DEFAULT_CACHE_KEY, DEFAULT_PAGE_SIZE, SettingsOptions};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Collection holding one document per setting.
    pub collection: String,

    /// Keep the snapshot in an external cache.
    pub cache_enabled: bool,

    /// Store-side options (cache key, duration, page size, change tracking)
    pub settings: SettingsOptions,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Configuration error if `MONGODB_URI` is missing or a value does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mongodb_uri = var("MONGODB_URI")
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| SettingsError::config("MONGODB_URI must be set"))?;

        let cache_enabled = match var("SETTINGS_CACHE") {
            Some(raw) => parse_flag("SETTINGS_CACHE", &raw)?,
            None => true,
        };

        let track_changes = match var("SETTINGS_TRACK_CHANGES") {
            Some(raw) => parse_flag("SETTINGS_TRACK_CHANGES", &raw)?,
            None => false,
        };

        let cache_duration = var("SETTINGS_CACHE_TTL_SECS")
            .map(|raw| parse_number::<u64>("SETTINGS_CACHE_TTL_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let page_size = var("SETTINGS_PAGE_SIZE")
            .map(|raw| parse_number::<usize>("SETTINGS_PAGE_SIZE", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let settings = SettingsOptions::default()
            .cache_key(var("SETTINGS_CACHE_KEY").unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string()))
            .cache_duration(cache_duration)
            .page_size(page_size)
            .track_changes(track_changes);
        settings.validate(cache_enabled)?;

        Ok(Self {
            mongodb_uri,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "appsettings".to_string()),
            collection: var("SETTINGS_COLLECTION").unwrap_or_else(|| "settings".to_string()),
            cache_enabled,
            settings,
        })
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::config(format!("{name} must be a boolean, got `{raw}`"))),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| SettingsError::config(format!("{name} must be a number, got `{raw}`")))
}
