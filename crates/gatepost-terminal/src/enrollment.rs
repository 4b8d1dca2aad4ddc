//! Biometric enrollment state machine.
//!
//! Presenting the admin tag starts a session that registers one new
//! fingerprint in the first free slot of the sensor's library. The session
//! advances exactly one stage-step per pipeline tick, so waiting for a
//! finger never blocks the loop.
//!
//! # Stages
//!
//! ```text
//! FindSlot ─> AwaitFirstImage ─> Convert1 ─> AwaitRemoval ─> AwaitSecondImage
//!                                                                  │
//!               Done <─ Store <─ BuildModel <─ Convert2 <──────────┘
//! ```
//!
//! Any stage can fail into `Failed`. `Done` and `Failed` are terminal.
//! Nothing is rolled back on failure; a model is only ever written by the
//! final `Store` step.
//!
//! # Examples
//!
//! ```
//! use gatepost_hardware::mock::MockBiometric;
//! use gatepost_terminal::enrollment::{EnrollmentSession, EnrollmentStage};
//! use std::time::Instant;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (mut sensor, handle) = MockBiometric::new();
//! handle.fill_library();
//!
//! let mut session = EnrollmentSession::<MockBiometric>::new(None);
//! session.step(&mut sensor, Instant::now()).await;
//! assert_eq!(session.stage(), EnrollmentStage::Failed);
//! # }
//! ```

use crate::status::Status;
use gatepost_core::{Error, Result, TemplateId};
use gatepost_hardware::{BiometricSensor, Capture, FeatureSlot, HardwareError, SlotStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Stage of an enrollment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStage {
    /// Looking for the first free template slot.
    FindSlot,

    /// Waiting for the finger to be placed the first time.
    AwaitFirstImage,

    /// Extracting features of the first image.
    Convert1,

    /// Waiting for the finger to be lifted.
    AwaitRemoval,

    /// Waiting for the same finger to be placed again.
    AwaitSecondImage,

    /// Extracting features of the second image.
    Convert2,

    /// Combining both feature sets.
    BuildModel,

    /// Writing the model to the target slot.
    Store,

    /// Template stored.
    Done,

    /// Aborted; nothing was stored.
    Failed,
}

impl fmt::Display for EnrollmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage_str = match self {
            EnrollmentStage::FindSlot => "FindSlot",
            EnrollmentStage::AwaitFirstImage => "AwaitFirstImage",
            EnrollmentStage::Convert1 => "Convert1",
            EnrollmentStage::AwaitRemoval => "AwaitRemoval",
            EnrollmentStage::AwaitSecondImage => "AwaitSecondImage",
            EnrollmentStage::Convert2 => "Convert2",
            EnrollmentStage::BuildModel => "BuildModel",
            EnrollmentStage::Store => "Store",
            EnrollmentStage::Done => "Done",
            EnrollmentStage::Failed => "Failed",
        };
        write!(f, "{}", stage_str)
    }
}

impl EnrollmentStage {
    /// Check if moving to `target` is allowed from this stage.
    ///
    /// ```
    /// use gatepost_terminal::enrollment::EnrollmentStage;
    ///
    /// assert!(EnrollmentStage::FindSlot.can_transition_to(&EnrollmentStage::AwaitFirstImage));
    /// assert!(EnrollmentStage::Convert2.can_transition_to(&EnrollmentStage::Failed));
    /// assert!(!EnrollmentStage::FindSlot.can_transition_to(&EnrollmentStage::Store));
    /// assert!(!EnrollmentStage::Done.can_transition_to(&EnrollmentStage::Failed));
    /// ```
    pub fn can_transition_to(&self, target: &EnrollmentStage) -> bool {
        use EnrollmentStage::*;

        if self.is_terminal() {
            return false;
        }

        matches!(
            (self, target),
            (_, Failed)
                | (FindSlot, AwaitFirstImage)
                | (AwaitFirstImage, Convert1)
                | (Convert1, AwaitRemoval)
                | (AwaitRemoval, AwaitSecondImage)
                | (AwaitSecondImage, Convert2)
                | (Convert2, BuildModel)
                | (BuildModel, Store)
                | (Store, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStage::Done | EnrollmentStage::Failed)
    }
}

/// One enrollment attempt.
///
/// Holds the intermediate sensor tokens between steps. Dropping the
/// session discards them without touching the library.
pub struct EnrollmentSession<B: BiometricSensor> {
    stage: EnrollmentStage,
    target_id: Option<TemplateId>,
    stage_entered_at: Option<Instant>,
    removal_timeout: Option<Duration>,
    image: Option<B::Image>,
    first: Option<B::Template>,
    second: Option<B::Template>,
    model: Option<B::Model>,
    history: Vec<EnrollmentStage>,
}

impl<B: BiometricSensor> EnrollmentSession<B> {
    /// Start a session in `FindSlot`.
    ///
    /// `removal_timeout` bounds `AwaitRemoval`; `None` waits indefinitely.
    pub fn new(removal_timeout: Option<Duration>) -> Self {
        Self {
            stage: EnrollmentStage::FindSlot,
            target_id: None,
            stage_entered_at: None,
            removal_timeout,
            image: None,
            first: None,
            second: None,
            model: None,
            history: vec![EnrollmentStage::FindSlot],
        }
    }

    pub fn stage(&self) -> EnrollmentStage {
        self.stage
    }

    /// Slot chosen by `FindSlot`, once found.
    pub fn target_id(&self) -> Option<TemplateId> {
        self.target_id
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Every stage entered so far, in order.
    pub fn history(&self) -> &[EnrollmentStage] {
        &self.history
    }

    /// Move to `next`, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if `next` is not reachable
    /// from the current stage.
    pub fn transition_to(&mut self, next: EnrollmentStage, now: Instant) -> Result<()> {
        if !self.stage.can_transition_to(&next) {
            return Err(Error::InvalidStateTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }

        debug!(from = %self.stage, to = %next, "Enrollment stage change");
        self.stage = next;
        self.stage_entered_at = Some(now);
        self.history.push(next);
        Ok(())
    }

    fn advance(&mut self, next: EnrollmentStage, now: Instant) {
        if let Err(e) = self.transition_to(next, now) {
            warn!(error = %e, "Enrollment aborted");
            self.stage = EnrollmentStage::Failed;
            self.history.push(EnrollmentStage::Failed);
        }
    }

    fn fail(&mut self, error: &HardwareError, now: Instant) -> Option<Status> {
        warn!(stage = %self.stage, error = %error, "Enrollment failed");
        self.advance(EnrollmentStage::Failed, now);
        Some(Status::EnrollmentFailed)
    }

    /// Run one stage-step against the sensor.
    ///
    /// Returns a status to show when the step produced one. Calling this on
    /// a finished session does nothing.
    pub async fn step(&mut self, sensor: &mut B, now: Instant) -> Option<Status> {
        if self.stage_entered_at.is_none() {
            self.stage_entered_at = Some(now);
        }

        match self.stage {
            EnrollmentStage::FindSlot => self.find_slot(sensor, now).await,
            EnrollmentStage::AwaitFirstImage => self.await_image(sensor, now).await,
            EnrollmentStage::Convert1 => self.convert(sensor, FeatureSlot::One, now).await,
            EnrollmentStage::AwaitRemoval => self.await_removal(sensor, now).await,
            EnrollmentStage::AwaitSecondImage => self.await_image(sensor, now).await,
            EnrollmentStage::Convert2 => self.convert(sensor, FeatureSlot::Two, now).await,
            EnrollmentStage::BuildModel => self.build_model(sensor, now).await,
            EnrollmentStage::Store => self.store(sensor, now).await,
            EnrollmentStage::Done | EnrollmentStage::Failed => None,
        }
    }

    async fn find_slot(&mut self, sensor: &mut B, now: Instant) -> Option<Status> {
        for id in TemplateId::all() {
            match sensor.probe(id).await {
                Ok(SlotStatus::Free) => {
                    info!(template_id = %id, "Enrolling into free slot");
                    self.target_id = Some(id);
                    self.advance(EnrollmentStage::AwaitFirstImage, now);
                    return Some(Status::PlaceFinger { id });
                }
                Ok(SlotStatus::Occupied) => {}
                Err(e) => return self.fail(&e, now),
            }
        }

        warn!("No free template slot");
        self.advance(EnrollmentStage::Failed, now);
        Some(Status::LibraryFull)
    }

    async fn await_image(&mut self, sensor: &mut B, now: Instant) -> Option<Status> {
        match sensor.capture().await {
            Ok(Capture::Image(image)) => {
                self.image = Some(image);
                let next = if self.stage == EnrollmentStage::AwaitFirstImage {
                    EnrollmentStage::Convert1
                } else {
                    EnrollmentStage::Convert2
                };
                self.advance(next, now);
                None
            }
            Ok(Capture::NoFinger) => {
                trace!(stage = %self.stage, "Waiting for finger");
                None
            }
            Err(e) => self.fail(&e, now),
        }
    }

    async fn convert(&mut self, sensor: &mut B, slot: FeatureSlot, now: Instant) -> Option<Status> {
        let Some(image) = self.image.take() else {
            return self.fail(&HardwareError::other("no image to convert"), now);
        };

        match sensor.extract_features(image, slot).await {
            Ok(template) => match slot {
                FeatureSlot::One => {
                    self.first = Some(template);
                    self.advance(EnrollmentStage::AwaitRemoval, now);
                    Some(Status::RemoveFinger)
                }
                FeatureSlot::Two => {
                    self.second = Some(template);
                    self.advance(EnrollmentStage::BuildModel, now);
                    None
                }
            },
            Err(e) => self.fail(&e, now),
        }
    }

    async fn await_removal(&mut self, sensor: &mut B, now: Instant) -> Option<Status> {
        if let (Some(timeout), Some(entered)) = (self.removal_timeout, self.stage_entered_at)
            && now.saturating_duration_since(entered) >= timeout
        {
            let error = HardwareError::timeout(timeout.as_millis() as u64);
            return self.fail(&error, now);
        }

        match sensor.capture().await {
            Ok(Capture::NoFinger) => {
                self.advance(EnrollmentStage::AwaitSecondImage, now);
                Some(Status::PlaceFingerAgain)
            }
            Ok(Capture::Image(_)) => {
                trace!("Finger still on sensor");
                None
            }
            Err(e) => self.fail(&e, now),
        }
    }

    async fn build_model(&mut self, sensor: &mut B, now: Instant) -> Option<Status> {
        let (Some(first), Some(second)) = (self.first.take(), self.second.take()) else {
            return self.fail(&HardwareError::other("missing templates"), now);
        };

        match sensor.build_model(&first, &second).await {
            Ok(model) => {
                self.model = Some(model);
                self.advance(EnrollmentStage::Store, now);
                None
            }
            Err(e) => self.fail(&e, now),
        }
    }

    async fn store(&mut self, sensor: &mut B, now: Instant) -> Option<Status> {
        let (Some(model), Some(id)) = (self.model.take(), self.target_id) else {
            return self.fail(&HardwareError::other("nothing to store"), now);
        };

        match sensor.store(model, id).await {
            Ok(()) => {
                info!(template_id = %id, "Fingerprint enrolled");
                self.advance(EnrollmentStage::Done, now);
                Some(Status::Enrolled { id })
            }
            Err(e) => self.fail(&e, now),
        }
    }
}
