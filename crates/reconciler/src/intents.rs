//! Outstanding action invocations awaiting an outcome.
//!
//! At most one action per kind is outstanding. Later invocations of the same
//! kind join it and share its outcome; an invocation of the opposite kind
//! supersedes it.

use gnb_events::{ActionKind, ActionResult, Intent, Outcome, UnitStatus};
use tokio::sync::oneshot;
use tracing::debug;

/// One caller of an outstanding action.
#[derive(Debug)]
struct Waiter {
    intent: Intent,
    reply: Option<oneshot::Sender<ActionResult>>,
}

/// An outstanding action and everyone waiting on it.
#[derive(Debug)]
pub struct PendingAction {
    kind: ActionKind,
    waiters: Vec<Waiter>,
}

impl PendingAction {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Number of invocations collapsed into this action.
    #[must_use]
    pub fn callers(&self) -> usize {
        self.waiters.len()
    }

    /// Answer every caller. Returns one result per invocation.
    pub fn resolve(self, outcome: Outcome, message: &str, status: &UnitStatus) -> Vec<ActionResult> {
        self.waiters
            .into_iter()
            .map(|waiter| {
                let intent = &waiter.intent;
                let result = match outcome {
                    Outcome::Success => ActionResult::success(intent, message, status.clone()),
                    Outcome::Failure => ActionResult::failure(intent, message, status.clone()),
                    Outcome::Cancelled => ActionResult::cancelled(intent, message, status.clone()),
                };
                if let Some(reply) = waiter.reply {
                    if reply.send(result.clone()).is_err() {
                        debug!(id = %waiter.intent.id, "Action caller went away");
                    }
                }
                result
            })
            .collect()
    }
}

/// Outstanding start and stop actions.
#[derive(Debug, Default)]
pub struct IntentTable {
    start: Option<PendingAction>,
    stop: Option<PendingAction>,
}

impl IntentTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: ActionKind) -> &mut Option<PendingAction> {
        match kind {
            ActionKind::StartRadio => &mut self.start,
            ActionKind::StopRadio => &mut self.stop,
        }
    }

    /// Register an invocation.
    ///
    /// Returns the opposing action it supersedes, for the caller to cancel.
    pub fn submit(
        &mut self,
        intent: Intent,
        reply: Option<oneshot::Sender<ActionResult>>,
    ) -> Option<PendingAction> {
        let kind = intent.kind;
        let superseded = self.slot(kind.opposite()).take();
        let waiter = Waiter { intent, reply };
        self.slot(kind)
            .get_or_insert_with(|| PendingAction {
                kind,
                waiters: Vec::new(),
            })
            .waiters
            .push(waiter);
        superseded
    }

    /// Remove the outstanding action of `kind` so it can be resolved.
    pub fn take(&mut self, kind: ActionKind) -> Option<PendingAction> {
        self.slot(kind).take()
    }

    #[must_use]
    pub const fn is_pending(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::StartRadio => self.start.is_some(),
            ActionKind::StopRadio => self.stop.is_some(),
        }
    }

    /// Remove every outstanding action.
    pub fn drain(&mut self) -> Vec<PendingAction> {
        [self.start.take(), self.stop.take()].into_iter().flatten().collect()
    }
}
