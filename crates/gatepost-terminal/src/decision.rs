//! Reporting credential events and interpreting the authority's answer.
//!
//! Both credential kinds go through the same [`DecisionClient::report`]
//! primitive but differ in what the answer is used for:
//!
//! - **Tag**: [`DecisionClient::decide_tag`]. The answer is the decision; the
//!   gate opens only for a granted verdict.
//! - **Biometric**: [`DecisionClient::notify_biometric`]. The gate has already
//!   opened on the local match; the answer only selects the message shown.

use crate::status::Status;
use gatepost_core::{CredentialEvent, CredentialKind, DeviceIdentity};
use gatepost_network::{ReportError, Reporter};
use gatepost_protocol::{ReportRequest, Verdict};
use tracing::{info, warn};

/// Result of one report.
#[derive(Debug)]
pub enum Outcome {
    /// The authority answered.
    Decided(Verdict),

    /// No usable answer. Nothing is synthesized in its place.
    Unavailable(ReportError),
}

impl Outcome {
    /// Whether this outcome lets a tag holder through.
    pub fn grants_access(&self) -> bool {
        matches!(self, Outcome::Decided(verdict) if verdict.is_granted())
    }

    /// Message for the person at the terminal.
    pub fn status(&self) -> Status {
        match self {
            Outcome::Decided(Verdict::Granted { name }) => Status::Granted { name: name.clone() },
            Outcome::Decided(Verdict::Denied { name }) => Status::Denied { name: name.clone() },
            Outcome::Decided(Verdict::NotFound) => Status::NotFound,
            Outcome::Unavailable(_) => Status::ServerUnavailable,
        }
    }
}

/// Client sending credential events to the remote authority.
pub struct DecisionClient<P> {
    reporter: P,
    identity: DeviceIdentity,
}

impl<P: Reporter> DecisionClient<P> {
    pub fn new(reporter: P, identity: DeviceIdentity) -> Self {
        Self { reporter, identity }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Send one event and interpret the reply. Never retried.
    pub async fn report(&mut self, event: &CredentialEvent) -> Outcome {
        let request = ReportRequest::for_event(event, &self.identity);

        match self.reporter.report(&request).await {
            Ok(reply) => {
                let verdict = reply.verdict();
                info!(credential = %event, verdict = ?verdict, "Authority answered");
                Outcome::Decided(verdict)
            }
            Err(e) => {
                warn!(credential = %event, error = %e, "Report failed");
                Outcome::Unavailable(e)
            }
        }
    }

    /// Ask the authority whether a tag holder may pass.
    pub async fn decide_tag(&mut self, event: &CredentialEvent) -> Outcome {
        debug_assert_eq!(event.kind(), CredentialKind::Tag);
        self.report(event).await
    }

    /// Tell the authority about a fingerprint that has already opened the
    /// gate. The outcome never affects the gate.
    pub async fn notify_biometric(&mut self, event: &CredentialEvent) -> Outcome {
        debug_assert_eq!(event.kind(), CredentialKind::Biometric);
        self.report(event).await
    }
}
