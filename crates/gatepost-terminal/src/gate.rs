//! Timed gate relay pulse.

use gatepost_core::constants::GATE_HOLD_MS;
use gatepost_hardware::{Relay, Result};
use std::time::Duration;
use tracing::{error, info};

/// Opens the gate by pulsing its relay.
pub struct GateActuator<R> {
    relay: R,
    hold: Duration,
}

impl<R: Relay> GateActuator<R> {
    pub fn new(relay: R) -> Self {
        Self::with_hold(relay, Duration::from_millis(GATE_HOLD_MS))
    }

    pub fn with_hold(relay: R, hold: Duration) -> Self {
        Self { relay, hold }
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Energize the relay, hold, release.
    ///
    /// Returns after the release. If energizing fails the relay is still
    /// released before the error is returned.
    pub async fn open(&mut self) -> Result<()> {
        info!(hold_ms = self.hold.as_millis() as u64, "Opening gate");

        if let Err(e) = self.relay.set_active(true).await {
            error!(error = %e, "Failed to energize gate relay");
            if let Err(release) = self.relay.set_active(false).await {
                error!(error = %release, "Failed to release gate relay");
            }
            return Err(e);
        }

        tokio::time::sleep(self.hold).await;

        self.relay.set_active(false).await.inspect_err(|e| {
            error!(error = %e, "Failed to release gate relay");
        })
    }

    /// Release the relay without pulsing, e.g. on shutdown.
    pub async fn release(&mut self) -> Result<()> {
        self.relay.set_active(false).await
    }
}
