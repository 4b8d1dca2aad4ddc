//! Mock fingerprint sensor implementation for testing and development.
//!
//! This module provides a simulated sensor with an in-memory template store.
//! Fingers are identified by a plain number; placing finger `7` and later
//! searching for it matches whichever slot finger `7` was enrolled into.

use crate::{
    HardwareError, Result,
    traits::BiometricSensor,
    types::{Capture, FeatureSlot, SlotStatus},
};
use gatepost_core::{BiometricMatch, TemplateId};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Confidence reported for every mock match.
const MOCK_CONFIDENCE: u16 = 180;

/// Image of a finger, as produced by [`MockBiometric::capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockImage {
    pub finger: u32,
}

/// Features extracted from a [`MockImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTemplate {
    pub finger: u32,
    pub slot: FeatureSlot,
}

/// Model combining two templates of one finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockModel {
    pub finger: u32,
}

/// Sensor operation, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorOp {
    Convert,
    Search,
    BuildModel,
    Store,
    Probe,
}

/// One call made to the mock, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorCall {
    Capture,
    Convert(FeatureSlot),
    Search,
    BuildModel,
    Store(TemplateId),
    Probe(TemplateId),
}

/// Scripted outcome of one `capture()` call.
#[derive(Debug, Clone)]
enum ScriptedCapture {
    Finger(u32),
    Lifted,
    Error(String),
}

#[derive(Debug, Default)]
struct SensorState {
    captures: VecDeque<ScriptedCapture>,
    library: BTreeMap<TemplateId, u32>,
    failures: HashSet<SensorOp>,
    calls: Vec<SensorCall>,
}

fn lock(state: &Mutex<SensorState>) -> MutexGuard<'_, SensorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock fingerprint sensor for testing and development.
///
/// `capture()` returns scripted outcomes queued through the handle and
/// reports `NoFinger` once the script runs out.
///
/// # Examples
///
/// ```
/// use gatepost_core::TemplateId;
/// use gatepost_hardware::mock::MockBiometric;
/// use gatepost_hardware::traits::BiometricSensor;
/// use gatepost_hardware::types::{Capture, FeatureSlot};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> gatepost_hardware::Result<()> {
///     let (mut sensor, handle) = MockBiometric::new();
///     let slot = TemplateId::new(3).unwrap();
///     handle.enroll(slot, 7);
///     handle.place_finger(7);
///
///     let Capture::Image(image) = sensor.capture().await? else {
///         panic!("expected an image");
///     };
///     let template = sensor.extract_features(image, FeatureSlot::One).await?;
///     let found = sensor.search(&template).await?.unwrap();
///     assert_eq!(found.template_id, slot);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBiometric {
    state: Arc<Mutex<SensorState>>,
}

impl MockBiometric {
    /// Create a new mock sensor with an empty store.
    pub fn new() -> (Self, MockBiometricHandle) {
        let state = Arc::new(Mutex::new(SensorState::default()));
        let handle = MockBiometricHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }

    /// Record the call and consume a pending injected failure for `op`.
    fn enter(&self, call: SensorCall, op: Option<SensorOp>) -> bool {
        let mut state = lock(&self.state);
        state.calls.push(call);
        op.is_some_and(|op| state.failures.remove(&op))
    }
}

impl BiometricSensor for MockBiometric {
    type Image = MockImage;
    type Template = MockTemplate;
    type Model = MockModel;

    async fn capture(&mut self) -> Result<Capture<MockImage>> {
        self.enter(SensorCall::Capture, None);

        match lock(&self.state).captures.pop_front() {
            Some(ScriptedCapture::Finger(finger)) => Ok(Capture::Image(MockImage { finger })),
            Some(ScriptedCapture::Lifted) | None => Ok(Capture::NoFinger),
            Some(ScriptedCapture::Error(message)) => Err(HardwareError::capture(message)),
        }
    }

    async fn extract_features(
        &mut self,
        image: MockImage,
        slot: FeatureSlot,
    ) -> Result<MockTemplate> {
        if self.enter(SensorCall::Convert(slot), Some(SensorOp::Convert)) {
            return Err(HardwareError::conversion("image too messy"));
        }

        Ok(MockTemplate {
            finger: image.finger,
            slot,
        })
    }

    async fn search(&mut self, template: &MockTemplate) -> Result<Option<BiometricMatch>> {
        if self.enter(SensorCall::Search, Some(SensorOp::Search)) {
            return Err(HardwareError::search("library read failed"));
        }

        let state = lock(&self.state);
        Ok(state
            .library
            .iter()
            .find(|(_, finger)| **finger == template.finger)
            .map(|(id, _)| BiometricMatch {
                template_id: *id,
                confidence: MOCK_CONFIDENCE,
            }))
    }

    async fn build_model(
        &mut self,
        first: &MockTemplate,
        second: &MockTemplate,
    ) -> Result<MockModel> {
        if self.enter(SensorCall::BuildModel, Some(SensorOp::BuildModel)) {
            return Err(HardwareError::build_model("model generation failed"));
        }

        if first.finger != second.finger {
            return Err(HardwareError::build_model("fingers do not match"));
        }

        Ok(MockModel {
            finger: first.finger,
        })
    }

    async fn store(&mut self, model: MockModel, id: TemplateId) -> Result<()> {
        if self.enter(SensorCall::Store(id), Some(SensorOp::Store)) {
            return Err(HardwareError::store("flash write failed"));
        }

        lock(&self.state).library.insert(id, model.finger);
        Ok(())
    }

    async fn probe(&mut self, id: TemplateId) -> Result<SlotStatus> {
        if self.enter(SensorCall::Probe(id), Some(SensorOp::Probe)) {
            return Err(HardwareError::store("slot read failed"));
        }

        Ok(if lock(&self.state).library.contains_key(&id) {
            SlotStatus::Occupied
        } else {
            SlotStatus::Free
        })
    }
}

/// Handle for scripting and inspecting a mock fingerprint sensor.
#[derive(Debug, Clone)]
pub struct MockBiometricHandle {
    state: Arc<Mutex<SensorState>>,
}

impl MockBiometricHandle {
    /// Next capture sees `finger` on the sensor.
    pub fn place_finger(&self, finger: u32) {
        lock(&self.state)
            .captures
            .push_back(ScriptedCapture::Finger(finger));
    }

    /// Next capture sees an empty sensor.
    ///
    /// Captures past the end of the script are empty anyway; this is for
    /// putting a gap between two placements.
    pub fn lift_finger(&self) {
        lock(&self.state).captures.push_back(ScriptedCapture::Lifted);
    }

    /// Next capture fails with a capture error.
    pub fn fail_capture(&self, message: impl Into<String>) {
        lock(&self.state)
            .captures
            .push_back(ScriptedCapture::Error(message.into()));
    }

    /// The next call of `op` fails.
    pub fn fail_next(&self, op: SensorOp) {
        lock(&self.state).failures.insert(op);
    }

    /// Put `finger` into slot `id` directly.
    pub fn enroll(&self, id: TemplateId, finger: u32) {
        lock(&self.state).library.insert(id, finger);
    }

    /// Occupy every slot of the store with placeholder fingers.
    pub fn fill_library(&self) {
        let mut state = lock(&self.state);
        for id in TemplateId::all() {
            state.library.entry(id).or_insert(u32::MAX);
        }
    }

    /// Finger stored in slot `id`, if any.
    pub fn stored_finger(&self, id: TemplateId) -> Option<u32> {
        lock(&self.state).library.get(&id).copied()
    }

    /// Number of occupied slots.
    pub fn template_count(&self) -> usize {
        lock(&self.state).library.len()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<SensorCall> {
        lock(&self.state).calls.clone()
    }

    /// Whether any call other than probing happened.
    pub fn touched_beyond_probe(&self) -> bool {
        lock(&self.state)
            .calls
            .iter()
            .any(|call| !matches!(call, SensorCall::Probe(_)))
    }

    /// Scripted captures not yet consumed.
    pub fn pending_captures(&self) -> usize {
        lock(&self.state).captures.len()
    }
}
