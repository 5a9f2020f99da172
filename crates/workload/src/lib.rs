//! Supervision of the simulated gNB process.
//!
//! A [`Supervisor`] exclusively owns the simulator process and its
//! configuration file. [`ProcessSupervisor`] runs the real binary;
//! [`InMemorySupervisor`] only records what it was asked to do.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod memory;
pub mod process;
pub mod state;
pub mod supervisor;

pub use error::{Result, SupervisorError};
pub use memory::InMemorySupervisor;
pub use process::ProcessSupervisor;
pub use state::{ApplyOutcome, ObservedState};
pub use supervisor::Supervisor;
