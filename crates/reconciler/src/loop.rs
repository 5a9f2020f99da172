//! Single-consumer dispatch loop.
//!
//! All events, actions, retry timers and health checks reach the reconciler
//! through one queue, so turns never overlap.

use std::time::Duration;

use gnb_core::ReconcilerSettings;
use gnb_events::OperatorEvent;
use gnb_workload::Supervisor;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::actions::ActionHandle;
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::types::Dispatch;

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Interval between health checks.
    pub health_interval: Duration,
    /// Events buffered before senders wait.
    pub queue_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_settings(&ReconcilerSettings::default())
    }
}

impl LoopConfig {
    #[must_use]
    pub fn from_settings(settings: &ReconcilerSettings) -> Self {
        Self {
            health_interval: settings.health_interval().max(Duration::from_millis(1)),
            queue_capacity: settings.queue_capacity.max(1),
        }
    }
}

/// Producer side of the event queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Dispatch>,
}

impl EventSender {
    /// Queue an event for the reconciler.
    ///
    /// # Errors
    ///
    /// Returns `Error::LoopStopped` once the loop has exited.
    pub async fn send(&self, event: OperatorEvent) -> Result<()> {
        self.tx
            .send(Dispatch::from(event))
            .await
            .map_err(|_| Error::LoopStopped)
    }

    /// Handle for invoking actions and awaiting their results.
    #[must_use]
    pub fn actions(&self) -> ActionHandle {
        ActionHandle::new(self.tx.clone())
    }
}

/// Drives a [`Reconciler`] until stopped or until every sender is gone.
pub struct ReconciliationLoop<S> {
    reconciler: Reconciler<S>,
    queue: mpsc::Receiver<Dispatch>,
    config: LoopConfig,
    stop_rx: watch::Receiver<bool>,
    stop_tx: watch::Sender<bool>,
}

impl<S: Supervisor> ReconciliationLoop<S> {
    /// Create a loop and the sender feeding it.
    pub fn new(reconciler: Reconciler<S>, config: LoopConfig) -> (Self, EventSender) {
        let (tx, queue) = mpsc::channel(config.queue_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        let this = Self {
            reconciler,
            queue,
            config,
            stop_rx,
            stop_tx,
        };
        (this, EventSender { tx })
    }

    /// Get a stopper handle.
    pub fn stopper(&self) -> LoopStopper {
        LoopStopper {
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Run until stopped, then shut the workload down.
    ///
    /// Returns the reconciler so its final state can be inspected.
    pub async fn run(self) -> Reconciler<S> {
        let Self {
            mut reconciler,
            mut queue,
            config,
            mut stop_rx,
            stop_tx: _stop_tx,
        } = self;

        info!(
            health_interval_ms = config.health_interval.as_millis(),
            queue_capacity = config.queue_capacity,
            "Starting reconciliation loop"
        );
        reconciler.reconcile().await;

        let mut health = tokio::time::interval_at(
            Instant::now() + config.health_interval,
            config.health_interval,
        );
        health.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let retry_at = reconciler.next_retry_at();
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        info!("Reconciliation loop stopped");
                        break;
                    }
                }
                dispatch = queue.recv() => match dispatch {
                    Some(dispatch) => reconciler.handle(dispatch).await,
                    None => {
                        info!("Event queue closed");
                        break;
                    }
                },
                () = retry_due(retry_at) => {
                    debug!("Retry timer fired");
                    reconciler.handle(Dispatch::Event(OperatorEvent::Timer)).await;
                }
                _ = health.tick() => {
                    reconciler.handle(Dispatch::Event(OperatorEvent::HealthCheck)).await;
                }
            }
        }

        queue.close();
        reconciler.shutdown().await;
        reconciler
    }
}

async fn retry_due(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Handle to stop a reconciliation loop.
#[derive(Clone)]
pub struct LoopStopper {
    stop_tx: watch::Sender<bool>,
}

impl LoopStopper {
    /// Stop the loop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}
