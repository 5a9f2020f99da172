//! Error types for workload supervision.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for supervisor operations.
pub type Result<T> = std::result::Result<T, SupervisorError>;

/// Failures while applying configuration or managing the process.
///
/// The reconciler retries these with backoff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    #[error("failed to write configuration to {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    #[error("failed to spawn '{binary}': {reason}")]
    SpawnFailed { binary: String, reason: String },

    #[error("process exited during startup ({status})")]
    ExitedDuringStartup { status: String },

    #[error("failed to stop process: {reason}")]
    StopFailed { reason: String },

    #[error("supervisor call timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("injected failure: {reason}")]
    Injected { reason: String },
}

impl SupervisorError {
    pub fn config_write(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigWrite {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn spawn_failed(binary: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            binary: binary.into(),
            reason: reason.into(),
        }
    }

    pub fn exited_during_startup(status: impl Into<String>) -> Self {
        Self::ExitedDuringStartup {
            status: status.into(),
        }
    }

    pub fn stop_failed(reason: impl Into<String>) -> Self {
        Self::StopFailed {
            reason: reason.into(),
        }
    }

    /// Create a timeout error from the bound that expired.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout {
            millis: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn injected(reason: impl Into<String>) -> Self {
        Self::Injected {
            reason: reason.into(),
        }
    }
}
