//! Remote reporting for gatepost.
//!
//! This crate carries credential events to the remote authority and brings
//! its decision back. The pipeline depends only on the [`Reporter`] trait;
//! [`HttpReporter`] is the production transport and [`mock::MockReporter`]
//! the scripted one used in tests.
//!
//! # Example
//!
//! ```no_run
//! use gatepost_core::{CredentialEvent, DeviceIdentity};
//! use gatepost_network::{HttpReporter, Reporter, ReporterConfig};
//! use gatepost_protocol::ReportRequest;
//! use std::time::{Duration, Instant};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReporterConfig {
//!     url: "http://10.0.0.5:8080/api/access".to_string(),
//!     timeout: Duration::from_millis(5000),
//! };
//! let mut reporter = HttpReporter::new(config)?;
//!
//! let identity = DeviceIdentity::new("lobby-east")?;
//! let event = CredentialEvent::tag(3_350_811, Instant::now());
//! let reply = reporter.report(&ReportRequest::for_event(&event, &identity)).await?;
//! println!("{:?}", reply.verdict());
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod http;
pub mod mock;

pub use http::{HttpReporter, ReporterConfig};

use gatepost_protocol::{ReportRequest, ReportResponse, WireError};
use thiserror::Error;

/// Errors that can occur while reporting an event
#[derive(Debug, Error)]
pub enum ReportError {
    /// No reply within the configured timeout
    #[error("Report timeout after {0}ms")]
    Timeout(u64),

    /// Connection could not be made or broke off
    #[error("Transport error: {0}")]
    Transport(String),

    /// The authority answered with a non-success status
    #[error("Authority returned HTTP {0}")]
    Status(u16),

    /// The reply body could not be interpreted
    #[error(transparent)]
    Malformed(#[from] WireError),

    /// The HTTP client could not be set up
    #[error("Client setup failed: {0}")]
    Setup(String),
}

/// Capability to send one credential event and receive the decision.
///
/// No retries: a failed report is returned to the caller as is.
pub trait Reporter: Send {
    async fn report(&mut self, request: &ReportRequest) -> Result<ReportResponse, ReportError>;
}
