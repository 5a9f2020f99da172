//! Typed events for the gNB operator.
//!
//! - **Events**: what the orchestrator tells the unit (relation data, option
//!   changes, action invocations, timers)
//! - **Intents**: queued action invocations with a correlation id
//! - **Outputs**: what the unit reports back (status, relation data, action
//!   results)
//!
//! Events and outputs have a JSON-lines wire form used by the hook bridge.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod event;
pub mod types;

pub use error::{Error, Result};
pub use event::{OperatorEvent, OperatorOutput};
pub use types::{
    ActionKind, ActionResult, GNB_IDENTITY_RELATION, Intent, IntentId, N2_RELATION, Outcome,
    StatusKind, UnitStatus,
};
