//! Core types, errors, and configuration for the gNB operator.
//!
//! - [`SiteConfig`]: radio site options (PLMN, TAC, cell identity, band)
//! - [`CoreEndpoint`]: AMF reachability learned from the `fiveg-n2` relation
//! - [`GnbIdentity`]: what this unit advertises on `fiveg_gnb_identity`
//! - [`OperatorConfig`]: the operator's own layered configuration

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod result;
pub mod site;

pub use config::{LogLevel, OperatorConfig, ReconcilerSettings, UnitSettings, WorkloadSettings};
pub use endpoint::{CoreEndpoint, SecurityParams, Transport};
pub use error::{Error, RelationDataError, ValidationError};
pub use identity::GnbIdentity;
pub use result::{Result, ResultExt};
pub use site::SiteConfig;
