//! Configuration rendering for the simulated gNB.
//!
//! Site options are validated into a [`ValidatedSite`] and combined with the
//! AMF [`CoreEndpoint`](gnb_core::CoreEndpoint) into a [`ConfigDocument`].
//! Rendering is a pure function of its inputs: the same options and endpoint
//! always produce the same bytes and the same [`ContentHash`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod document;
pub mod render;
pub mod validate;

pub use document::{ConfigDocument, ContentHash};
pub use render::Renderer;
pub use validate::{ValidatedSite, summarize, validate_endpoint, validate_site};
