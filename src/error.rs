//! Error types for settings operations.

use thiserror::Error;

/// Failure to turn persisted text back into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The record carries a type tag this crate does not know.
    #[error("unknown setting type `{0}`")]
    UnknownType(String),

    /// An `array` record does not hold valid JSON.
    #[error("malformed JSON value: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// Primary error type for settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required collaborator or option is misconfigured.
    #[error("invalid settings configuration: {0}")]
    Configuration(String),

    /// A persisted value could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The backing store rejected an operation.
    #[error("backing store operation failed: {0}")]
    Store(#[from] mongodb::error::Error),

    /// A dotted path cannot be written through the value it addresses.
    #[error("invalid setting path `{path}`: {reason}")]
    InvalidPath {
        /// Offending dotted path.
        path: String,
        /// Why the path could not be applied.
        reason: &'static str,
    },
}

impl SettingsError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SettingsError>;
