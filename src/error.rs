//! Error types for configuration resolution.

use crate::backends::BackendCategory;
use crate::config::Mode;
use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that abort a resolution attempt.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Inline configuration taken from an environment variable is not valid JSON.
    #[error("invalid JSON in {var} environment variable: {source}")]
    InlineJson {
        var: String,
        #[source]
        source: serde_json::Error,
    },

    /// The chosen configuration file exists but could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The chosen configuration file could not be decoded.
    #[error("failed to parse configuration file {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A decoded document does not fit the configuration layout.
    #[error("configuration from {origin} is invalid: {source}")]
    InvalidDocument {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// A field mandatory for the active mode is absent.
    #[error("{field} is mandatory in lithops section of the configuration ({mode} mode)")]
    MissingField { mode: Mode, field: &'static str },

    /// An override fragment does not fit the section it targets.
    #[error("invalid override for '{section}' section: {source}")]
    InvalidOverride {
        section: String,
        #[source]
        source: serde_json::Error,
    },

    /// A section needed by an extractor is missing from the document.
    #[error("'{section}' section is missing from the configuration")]
    MissingSection { section: String },

    /// No configuration contract is registered for the backend id.
    #[error("unknown {category} backend: '{id}'")]
    UnknownBackend { category: BackendCategory, id: String },

    /// A backend contract rejected its own section.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised by backend configuration contracts.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("'{field}' is mandatory in {backend} section of the configuration")]
    MissingField { backend: String, field: String },

    #[error("invalid value for '{field}' in {backend} section: {reason}")]
    InvalidValue {
        backend: String,
        field: String,
        reason: String,
    },

    #[error("{backend}: failed to read {}: {source}", path.display())]
    Io {
        backend: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    pub fn missing_field(backend: &str, field: &str) -> Self {
        Self::MissingField {
            backend: backend.to_string(),
            field: field.to_string(),
        }
    }

    pub fn invalid_value(backend: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            backend: backend.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
