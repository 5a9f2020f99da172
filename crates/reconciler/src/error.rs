//! Error types for the reconciler crate.

use gnb_events::ActionKind;
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to callers of the loop and action handles.
///
/// Supervisor and validation failures never appear here; the reconciler turns
/// them into unit status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The dispatcher queue is closed.
    #[error("reconciliation loop stopped")]
    LoopStopped,

    /// The loop dropped an action without answering it.
    #[error("action '{action}' was dropped without a result")]
    ReplyDropped { action: ActionKind },
}

impl Error {
    /// Create a reply dropped error.
    pub const fn reply_dropped(action: ActionKind) -> Self {
        Self::ReplyDropped { action }
    }
}
