//! Peripheral trait definitions.
//!
//! These traits are the contract between the credential pipeline and the
//! terminal's devices: the tag reader's byte stream, the fingerprint
//! sensor, the gate relay, the status display and the exit button. The
//! pipeline is generic over them, so mock devices and real drivers are
//! interchangeable.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.
//!
//! # Polling contract
//!
//! The pipeline is a cooperative loop. Methods that sample an input
//! ([`TagSource::poll_byte`], [`BiometricSensor::capture`],
//! [`ExitButton::is_pressed`]) must return promptly when there is nothing to
//! report instead of waiting for input to arrive.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{Capture, FeatureSlot, SlotStatus, StatusMessage};
use gatepost_core::{BiometricMatch, TemplateId};

/// Serial byte stream from the contactless tag reader.
///
/// # Examples
///
/// ```no_run
/// use gatepost_hardware::traits::TagSource;
/// use gatepost_hardware::Result;
///
/// async fn drain<T: TagSource>(reader: &mut T) -> Result<Vec<u8>> {
///     let mut bytes = Vec::new();
///     while let Some(byte) = reader.poll_byte().await? {
///         bytes.push(byte);
///     }
///     Ok(bytes)
/// }
/// ```
pub trait TagSource: Send {
    /// Next received byte, or `None` if nothing is waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying port fails.
    async fn poll_byte(&mut self) -> Result<Option<u8>>;
}

/// Fingerprint sensor with an on-board template store.
///
/// Image, feature and model representations are opaque to the pipeline;
/// each sensor chooses its own through the associated types. Images and
/// feature templates are consumed by the next step, so a stale capture can
/// never be converted twice.
///
/// # Examples
///
/// Identification of whatever finger is on the sensor:
///
/// ```no_run
/// use gatepost_core::BiometricMatch;
/// use gatepost_hardware::traits::BiometricSensor;
/// use gatepost_hardware::types::{Capture, FeatureSlot};
/// use gatepost_hardware::Result;
///
/// async fn identify<B: BiometricSensor>(sensor: &mut B) -> Result<Option<BiometricMatch>> {
///     let Capture::Image(image) = sensor.capture().await? else {
///         return Ok(None);
///     };
///     let template = sensor.extract_features(image, FeatureSlot::One).await?;
///     sensor.search(&template).await
/// }
/// ```
pub trait BiometricSensor: Send {
    /// A captured fingerprint image.
    type Image: Send;

    /// Features extracted from one image.
    type Template: Send;

    /// Enrollable model built from two templates of the same finger.
    type Model: Send;

    /// Take an image if a finger is present.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Capture` when a finger is present but the
    /// image could not be taken, or a transport error.
    async fn capture(&mut self) -> Result<Capture<Self::Image>>;

    /// Extract features from `image` into the given sensor buffer.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Conversion` when the image is unusable.
    async fn extract_features(
        &mut self,
        image: Self::Image,
        slot: FeatureSlot,
    ) -> Result<Self::Template>;

    /// Look the template up in the store. `Ok(None)` means no match.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Search` when the search itself failed.
    async fn search(&mut self, template: &Self::Template) -> Result<Option<BiometricMatch>>;

    /// Combine two templates of the same finger.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::BuildModel` when the templates disagree.
    async fn build_model(
        &mut self,
        first: &Self::Template,
        second: &Self::Template,
    ) -> Result<Self::Model>;

    /// Persist a model under `id`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Store` when the write fails.
    async fn store(&mut self, model: Self::Model, id: TemplateId) -> Result<()>;

    /// Check whether `id` holds a template.
    async fn probe(&mut self, id: TemplateId) -> Result<SlotStatus>;
}

/// Output driving the gate's relay coil.
pub trait Relay: Send {
    /// Energize (`true`) or release (`false`) the relay.
    async fn set_active(&mut self, active: bool) -> Result<()>;
}

/// Short status messages for the person at the terminal.
pub trait StatusDisplay: Send {
    /// Put `message` on the display. Returns as soon as it is shown; any
    /// pause for `message.duration` is the caller's business.
    async fn show(&mut self, message: &StatusMessage) -> Result<()>;
}

/// Local push button that opens the gate from the inside.
pub trait ExitButton: Send {
    /// Whether a press happened since the last poll.
    async fn is_pressed(&mut self) -> Result<bool>;
}

