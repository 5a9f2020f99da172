//! The supervision contract shared by real and in-memory supervisors.

use async_trait::async_trait;
use gnb_render::ConfigDocument;

use crate::error::Result;
use crate::state::{ApplyOutcome, ObservedState};

/// Owns the managed process and its configuration file.
#[async_trait]
pub trait Supervisor: Send {
    /// Make the process run with `config`.
    ///
    /// A no-op when the live process already runs this document (by content
    /// hash); otherwise an orderly stop followed by a start.
    ///
    /// # Errors
    ///
    /// Returns a `SupervisorError` when the file cannot be written or the
    /// process cannot be started.
    async fn apply(&mut self, config: &ConfigDocument) -> Result<ApplyOutcome>;

    /// Stop the process if one is running.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::StopFailed` if the process does not exit.
    async fn stop(&mut self) -> Result<()>;

    /// Last known state. Never blocks on the process.
    fn status(&mut self) -> ObservedState;

    /// Clean up after an `apply` or `stop` the caller cut short.
    ///
    /// Any process the interrupted call left behind is killed and the applied
    /// document forgotten, so the next `apply` starts from scratch.
    fn abandon(&mut self, reason: &str);
}

#[async_trait]
impl<S: Supervisor + ?Sized> Supervisor for Box<S> {
    async fn apply(&mut self, config: &ConfigDocument) -> Result<ApplyOutcome> {
        (**self).apply(config).await
    }

    async fn stop(&mut self) -> Result<()> {
        (**self).stop().await
    }

    fn status(&mut self) -> ObservedState {
        (**self).status()
    }

    fn abandon(&mut self, reason: &str) {
        (**self).abandon(reason);
    }
}
