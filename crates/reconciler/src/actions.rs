//! `start-radio` and `stop-radio` entry points.

use gnb_events::{ActionKind, ActionResult, Intent};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Dispatch;

/// Invokes actions on a running loop and waits for their outcome.
///
/// The call returns once the reconciler resolves the intent: success when the
/// radio reached the requested state, failure when it cannot, and cancelled
/// when a later opposite action superseded it.
#[derive(Debug, Clone)]
pub struct ActionHandle {
    tx: mpsc::Sender<Dispatch>,
}

impl ActionHandle {
    pub(crate) const fn new(tx: mpsc::Sender<Dispatch>) -> Self {
        Self { tx }
    }

    /// # Errors
    ///
    /// See [`invoke`](Self::invoke).
    pub async fn start_radio(&self) -> Result<ActionResult> {
        self.invoke(ActionKind::StartRadio).await
    }

    /// # Errors
    ///
    /// See [`invoke`](Self::invoke).
    pub async fn stop_radio(&self) -> Result<ActionResult> {
        self.invoke(ActionKind::StopRadio).await
    }

    /// Queue an action and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns `Error::LoopStopped` if the loop is gone and
    /// `Error::ReplyDropped` if it exits before answering.
    pub async fn invoke(&self, kind: ActionKind) -> Result<ActionResult> {
        let intent = Intent::new(kind);
        debug!(id = %intent.id, action = %kind, "Queueing action");

        let (reply, answer) = oneshot::channel();
        self.tx
            .send(Dispatch::Action {
                intent,
                reply: Some(reply),
            })
            .await
            .map_err(|_| Error::LoopStopped)?;

        answer.await.map_err(|_| Error::reply_dropped(kind))
    }
}
