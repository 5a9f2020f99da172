//! Core error types for the gNB operator.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for configuration loading and site options.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("failed to read config file '{path}': {reason}")]
    ConfigRead { path: PathBuf, reason: String },

    #[error("failed to parse config file '{path}': {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("invalid configuration for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("unknown site option '{key}'")]
    UnknownOption { key: String },
}

impl Error {
    /// Create a config read error.
    pub fn config_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config parse error.
    pub fn config_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid config error for a key.
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown option error.
    pub fn unknown_option(key: impl Into<String>) -> Self {
        Self::UnknownOption { key: key.into() }
    }
}

/// A site option or endpoint field failed validation.
///
/// Recovered by blocking until the operator corrects the input; never
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} ({reason})")]
pub struct ValidationError {
    /// Option key or endpoint field that failed.
    pub field: String,
    /// Human-readable rule that was violated.
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error for a field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Peer relation data could not be interpreted as an AMF endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationDataError {
    #[error("relation data is missing key '{key}'")]
    MissingKey { key: String },

    #[error("relation key '{key}' has malformed value '{value}': {reason}")]
    Malformed {
        key: String,
        value: String,
        reason: String,
    },
}

impl RelationDataError {
    /// Create a missing key error.
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Create a malformed value error.
    pub fn malformed(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field_and_reason() {
        let err = ValidationError::new("mcc", "must be exactly 3 digits");
        assert_eq!(err.to_string(), "mcc (must be exactly 3 digits)");
    }

    #[test]
    fn relation_data_error_display() {
        let err = RelationDataError::malformed("port", "abc", "not a number");
        let text = err.to_string();
        assert!(text.contains("port"));
        assert!(text.contains("abc"));
        assert!(RelationDataError::missing_key("host")
            .to_string()
            .contains("'host'"));
    }

    #[test]
    fn config_errors_carry_path() {
        let err = Error::config_parse("/etc/operator.toml", "expected table");
        assert!(err.to_string().contains("/etc/operator.toml"));
    }
}
