//! Error types for the events crate.

use thiserror::Error;

/// Result type alias for event operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Event error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A hook line could not be decoded.
    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },

    /// An output record could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl Error {
    /// Create an invalid event error.
    pub fn invalid_event(reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            reason: reason.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }
}
