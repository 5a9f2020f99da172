//! Result type definition and extension traits.
//!
//! Provides combinators for Result types so that failures which should only
//! degrade behaviour are logged instead of unwrapped.

use crate::error::Error;

/// The standard Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait providing logged fallbacks for any displayable error.
pub trait ResultExt<T> {
    /// Convert a Result to an Option, logging the error if present.
    fn into_option_logged(self, what: &str) -> Option<T>;

    /// Get the value or a default, logging the error if present.
    fn or_default_logged(self, what: &str, default: T) -> T;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn into_option_logged(self, what: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "{what} failed");
                None
            }
        }
    }

    fn or_default_logged(self, what: &str, default: T) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "{what} failed, using default");
                default
            }
        }
    }
}
