#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # gnb-operator
//!
//! Reconciliation core for a simulated 5G gNB unit, wired to the orchestrator
//! through a JSON-lines hook bridge.
//!
//! This library re-exports the workspace crates for convenience.

pub mod bridge;
pub mod cli;
pub mod commands;

pub use gnb_core;
pub use gnb_events;
pub use gnb_reconciler;
pub use gnb_render;
pub use gnb_workload;
