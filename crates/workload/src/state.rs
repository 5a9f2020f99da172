//! Observed process state and apply outcomes.

use std::fmt;

/// Last known health of the managed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedState {
    /// Never started.
    NotStarted,
    /// Spawned but not yet past its startup grace period.
    Starting,
    Running,
    /// Exited unexpectedly or failed to start.
    Failed(String),
    /// Stopped on request.
    Stopped,
}

impl ObservedState {
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running | Self::Starting)
    }

    /// Whether no process is alive.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Stopped | Self::Failed(_))
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not-started"),
            Self::Starting => f.write_str("starting"),
            Self::Running => f.write_str("running"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// What `apply` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The running process already had this configuration.
    Unchanged,
    /// No process was running; one was started.
    Started,
    /// A running process was stopped and started with new configuration.
    Restarted,
}
