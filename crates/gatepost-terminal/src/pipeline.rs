//! The credential pipeline and its main loop.
//!
//! [`Pipeline`] owns every device and every piece of pipeline state. Each
//! [`tick`](Pipeline::tick) does one of:
//!
//! - advance an open enrollment session by one stage-step, or
//! - drain the tag reader until a frame completes, then poll the
//!   fingerprint sensor once.
//!
//! A completed credential passes the debounce gate and is then either the
//! admin tag (start enrollment) or reported to the authority. Status pauses
//! and gate holds are awaited inline: nothing else happens meanwhile.

use crate::debounce::DebounceGate;
use crate::decision::DecisionClient;
use crate::enrollment::{EnrollmentSession, EnrollmentStage};
use crate::gate::GateActuator;
use crate::lock::ProcessingLock;
use crate::status::Status;
use gatepost_core::constants::{DEBOUNCE_COOLDOWN_MS, GATE_HOLD_MS};
use gatepost_core::{BiometricMatch, CredentialEvent, DeviceIdentity};
use gatepost_hardware::{
    BiometricSensor, Capture, ExitButton, FeatureSlot, HardwareError, Relay, StatusDisplay,
    StatusMessage, TagSource,
};
use gatepost_network::Reporter;
use gatepost_protocol::{FrameDecoder, FrameError};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Timing of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Minimum spacing between accepted credentials.
    pub debounce: Duration,

    /// How long the gate relay stays energized.
    pub gate_hold: Duration,

    /// Bound on waiting for the finger to be lifted during enrollment.
    pub removal_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_COOLDOWN_MS),
            gate_hold: Duration::from_millis(GATE_HOLD_MS),
            removal_timeout: None,
        }
    }
}

/// The devices a pipeline drives.
pub struct Devices<T, B, R, D, P> {
    pub tags: T,
    pub sensor: B,
    pub relay: R,
    pub display: D,
    pub reporter: P,
}

/// Single owner of the pipeline state.
pub struct Pipeline<T, B, R, D, P>
where
    B: BiometricSensor,
{
    tags: T,
    sensor: B,
    gate: GateActuator<R>,
    display: D,
    decisions: DecisionClient<P>,
    decoder: FrameDecoder,
    debounce: DebounceGate,
    lock: ProcessingLock,
    enrollment: Option<EnrollmentSession<B>>,
    removal_timeout: Option<Duration>,
}

/// Current monotonic time on the tokio clock.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl<T, B, R, D, P> Pipeline<T, B, R, D, P>
where
    T: TagSource,
    B: BiometricSensor,
    R: Relay,
    D: StatusDisplay,
    P: Reporter,
{
    pub fn new(
        devices: Devices<T, B, R, D, P>,
        identity: DeviceIdentity,
        config: PipelineConfig,
    ) -> Self {
        Self {
            tags: devices.tags,
            sensor: devices.sensor,
            gate: GateActuator::with_hold(devices.relay, config.gate_hold),
            display: devices.display,
            decisions: DecisionClient::new(devices.reporter, identity),
            decoder: FrameDecoder::new(),
            debounce: DebounceGate::new(config.debounce),
            lock: ProcessingLock::new(),
            enrollment: None,
            removal_timeout: config.removal_timeout,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        self.decisions.identity()
    }

    /// Whether the processing lock is held.
    pub fn is_busy(&self) -> bool {
        self.lock.is_held()
    }

    /// Stage of the open enrollment session, if any.
    pub fn enrollment_stage(&self) -> Option<EnrollmentStage> {
        self.enrollment.as_ref().map(|session| session.stage())
    }

    /// Show the idle message.
    pub async fn start(&mut self) {
        info!(device = %self.identity(), "Pipeline ready");
        self.show(Status::Ready).await;
    }

    /// Run one scheduler cycle.
    pub async fn tick(&mut self) {
        if self.enrollment.is_some() {
            self.advance_enrollment().await;
            return;
        }

        if self.lock.is_held() {
            return;
        }

        if let Some(tag) = self.poll_tag().await {
            self.handle_tag(tag).await;
            return;
        }

        if let Some(found) = self.poll_sensor().await {
            self.handle_biometric(found).await;
        }
    }

    /// Open the gate on a local decision (exit button).
    ///
    /// Ignored while a decision or enrollment holds the lock. Returns
    /// whether the gate was pulsed.
    pub async fn open_gate_locally(&mut self) -> bool {
        if !self.lock.acquire() {
            debug!("Exit button ignored while busy");
            return false;
        }

        info!("Exit button pressed");
        let opened = self.open_gate().await;
        self.unlock().await;
        opened
    }

    /// Tick until `shutdown` completes, polling `button` between ticks.
    ///
    /// Shutdown is only observed between ticks, so a gate hold in progress
    /// always finishes with the relay released.
    pub async fn run<E, F>(&mut self, mut button: Option<E>, interval: Duration, shutdown: F)
    where
        E: ExitButton,
        F: Future<Output = ()>,
    {
        self.start().await;
        tokio::pin!(shutdown);

        loop {
            if let Some(button) = button.as_mut() {
                match button.is_pressed().await {
                    Ok(true) => {
                        self.open_gate_locally().await;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Exit button read failed"),
                }
            }

            self.tick().await;

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        if let Err(e) = self.gate.release().await {
            warn!(error = %e, "Failed to release gate relay on shutdown");
        }
        info!("Pipeline stopped");
    }

    /// Feed pending bytes to the decoder until a tag completes.
    async fn poll_tag(&mut self) -> Option<u32> {
        loop {
            let byte = match self.tags.poll_byte().await {
                Ok(Some(byte)) => byte,
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "Tag reader read failed");
                    self.decoder.reset();
                    return None;
                }
            };

            match self.decoder.feed(byte) {
                Ok(Some(tag)) => return Some(tag),
                Ok(None) => {}
                // Line noise between frames
                Err(FrameError::InvalidByte { position: 0, byte }) => {
                    trace!(byte, "Stray byte outside frame");
                }
                Err(e) => {
                    warn!(error = %e, "Tag frame discarded");
                    self.show(Status::TagReadError).await;
                    return None;
                }
            }
        }
    }

    /// Poll the sensor once and identify whatever finger is on it.
    async fn poll_sensor(&mut self) -> Option<BiometricMatch> {
        match self.identify().await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Fingerprint identification failed");
                self.show(Status::SensorError).await;
                None
            }
        }
    }

    async fn identify(&mut self) -> Result<Option<BiometricMatch>, HardwareError> {
        let Capture::Image(image) = self.sensor.capture().await? else {
            return Ok(None);
        };

        let template = self.sensor.extract_features(image, FeatureSlot::One).await?;
        match self.sensor.search(&template).await? {
            Some(found) => Ok(Some(found)),
            None => {
                info!("Fingerprint not in library");
                self.show(Status::FingerNotRecognized).await;
                Ok(None)
            }
        }
    }

    async fn handle_tag(&mut self, tag: u32) {
        let event = CredentialEvent::tag(tag, now());
        info!(tag, "Tag presented");

        if !self.admit(&event).await {
            return;
        }

        self.lock.acquire();

        if event.is_admin() {
            info!("Admin tag, entering enrollment");
            self.enrollment = Some(EnrollmentSession::new(self.removal_timeout));
            self.show(Status::EnrollmentStarted).await;
            return;
        }

        self.show(Status::PleaseWait).await;
        let outcome = self.decisions.decide_tag(&event).await;

        if outcome.grants_access() {
            self.announce(outcome.status()).await;
            self.open_gate().await;
        } else {
            self.show(outcome.status()).await;
        }

        self.finish().await;
    }

    async fn handle_biometric(&mut self, found: BiometricMatch) {
        let event = CredentialEvent::biometric(found.template_id, now());
        info!(
            template_id = %found.template_id,
            confidence = found.confidence,
            "Fingerprint matched"
        );

        if !self.admit(&event).await {
            return;
        }

        self.lock.acquire();

        // Local match decides; the report only picks the message
        self.open_gate().await;
        let outcome = self.decisions.notify_biometric(&event).await;
        self.show(outcome.status()).await;

        self.finish().await;
    }

    async fn admit(&mut self, event: &CredentialEvent) -> bool {
        if self.debounce.admit(event) {
            return true;
        }

        info!(credential = %event, "Credential rejected by cooldown");
        self.show(Status::TooSoon).await;
        false
    }

    async fn advance_enrollment(&mut self) {
        let Some(session) = self.enrollment.as_mut() else {
            return;
        };

        let status = session.step(&mut self.sensor, now()).await;
        let finished = session.is_finished();

        if let Some(status) = status {
            self.show(status).await;
        }

        if finished {
            if let Some(session) = self.enrollment.take() {
                info!(stage = %session.stage(), "Enrollment session closed");
            }
            self.finish().await;
        }
    }

    async fn open_gate(&mut self) -> bool {
        self.announce(Status::GateOpen).await;

        match self.gate.open().await {
            Ok(()) => true,
            Err(_) => {
                self.show(Status::GateFault).await;
                false
            }
        }
    }

    /// Release the lock and go back to idle.
    async fn finish(&mut self) {
        self.unlock().await;
        self.show(Status::Ready).await;
    }

    /// Release the lock, dropping whatever the tag reader received while it
    /// was held. Presentations made during a decision or enrollment are
    /// never processed later.
    async fn unlock(&mut self) {
        let mut discarded = 0usize;
        loop {
            match self.tags.poll_byte().await {
                Ok(Some(_)) => discarded += 1,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Tag reader read failed");
                    break;
                }
            }
        }
        if discarded > 0 {
            debug!(discarded, "Dropped tag reader input received while busy");
        }

        self.decoder.reset();
        self.lock.release();
    }

    /// Display a status and pause for its duration.
    async fn show(&mut self, status: Status) {
        let message = status.message();
        self.announce_message(&status, &message).await;

        if !message.duration.is_zero() {
            tokio::time::sleep(message.duration).await;
        }
    }

    /// Display a status without pausing.
    async fn announce(&mut self, status: Status) {
        let message = status.message();
        self.announce_message(&status, &message).await;
    }

    async fn announce_message(&mut self, status: &Status, message: &StatusMessage) {
        if let Err(e) = self.display.show(message).await {
            warn!(error = %e, status = ?status, "Display update failed");
        }
    }
}
