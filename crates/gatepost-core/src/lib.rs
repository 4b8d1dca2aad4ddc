//! Shared types for the gatepost credential pipeline.
//!
//! Every other crate in the workspace speaks in terms of the types defined
//! here: [`CredentialEvent`] for a single presentation, [`TemplateId`] for a
//! biometric slot, [`DeviceIdentity`] for the terminal's provisioned name.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
