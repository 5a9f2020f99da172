//! Event-driven reconciliation for the simulated gNB unit.
//!
//! The reconciler consumes one event at a time and drives the workload toward
//! the state the inputs call for:
//!
//! - **Inputs**: site options, `fiveg-n2` relation data, workload readiness,
//!   and the latched `start-radio` / `stop-radio` request
//! - **Desired state**: derived on every pass; either a rendered
//!   configuration to run, or a reason to stay stopped
//! - **Observed state**: what the supervisor reports about the process
//! - **Outputs**: unit status, gNB identity relation data, action results
//!
//! # Phases
//!
//! ```text
//! Stopped -> Converging -> Running
//!                \-> Degraded (retry with backoff, then wait)
//! ```
//!
//! Supervisor failures are retried with bounded exponential backoff. Once
//! retries are exhausted only an external event starts a new attempt.
//!
//! # Example
//!
//! ```ignore
//! use gnb_reconciler::{LoopConfig, Reconciler, ReconciliationLoop};
//! use gnb_workload::InMemorySupervisor;
//!
//! let (outbox, outputs) = tokio::sync::mpsc::unbounded_channel();
//! let reconciler = Reconciler::new(InMemorySupervisor::new(), &config, outbox);
//! let (runner, events) = ReconciliationLoop::new(reconciler, LoopConfig::default());
//! let actions = events.actions();
//! tokio::spawn(runner.run());
//! let result = actions.start_radio().await?;
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod actions;
pub mod backoff;
pub mod error;
pub mod intents;
pub mod r#loop;
pub mod reconciler;
pub mod relation;
pub mod types;

pub use actions::ActionHandle;
pub use backoff::{RetryDecision, RetryState, calculate_backoff};
pub use error::{Error, Result};
pub use intents::{IntentTable, PendingAction};
pub use r#loop::{EventSender, LoopConfig, LoopStopper, ReconciliationLoop};
pub use reconciler::{Outbox, Reconciler, UnitState};
pub use relation::{ChangeSet, RelationStateTracker};
pub use types::{DesiredState, Dispatch, EndpointGap, Phase, StopReason};
