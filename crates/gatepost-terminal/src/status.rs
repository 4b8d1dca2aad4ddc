//! Catalog of the messages the terminal shows.

use gatepost_core::TemplateId;
use gatepost_core::constants::{STATUS_LONG_MS, STATUS_SHORT_MS};
use gatepost_hardware::StatusMessage;
use std::time::Duration;

/// Everything the terminal can tell the person in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    PleaseWait,
    TooSoon,
    TagReadError,
    FingerNotRecognized,
    SensorError,
    GateOpen,
    GateFault,
    Granted { name: String },
    Denied { name: String },
    NotFound,
    ServerUnavailable,
    EnrollmentStarted,
    PlaceFinger { id: TemplateId },
    RemoveFinger,
    PlaceFingerAgain,
    Enrolled { id: TemplateId },
    EnrollmentFailed,
    LibraryFull,
}

impl Status {
    /// Text, emphasis and how long the pipeline pauses on it.
    pub fn message(&self) -> StatusMessage {
        let short = Duration::from_millis(STATUS_SHORT_MS);
        let long = Duration::from_millis(STATUS_LONG_MS);

        match self {
            Status::Ready => StatusMessage::normal("Ready", Duration::ZERO),
            Status::PleaseWait => StatusMessage::normal("Please wait...", Duration::ZERO),
            Status::TooSoon => StatusMessage::normal("Too soon, try again", short),
            Status::TagReadError => StatusMessage::failure("Tag read error", short),
            Status::FingerNotRecognized => StatusMessage::failure("Finger not recognized", short),
            Status::SensorError => StatusMessage::failure("Sensor error", short),
            Status::GateOpen => StatusMessage::success("Gate open", Duration::ZERO),
            Status::GateFault => StatusMessage::failure("Gate fault", short),
            Status::Granted { name } => StatusMessage::success(format!("Welcome, {name}"), long),
            Status::Denied { name } => {
                StatusMessage::failure(format!("Access denied, {name}"), long)
            }
            Status::NotFound => StatusMessage::failure("User not found", long),
            Status::ServerUnavailable => StatusMessage::failure("Server unavailable", long),
            Status::EnrollmentStarted => StatusMessage::normal("Enrollment mode", short),
            Status::PlaceFinger { id } => {
                StatusMessage::normal(format!("Place finger (slot {id})"), Duration::ZERO)
            }
            Status::RemoveFinger => StatusMessage::normal("Remove finger", Duration::ZERO),
            Status::PlaceFingerAgain => {
                StatusMessage::normal("Place same finger again", Duration::ZERO)
            }
            Status::Enrolled { id } => StatusMessage::success(format!("Stored as #{id}"), long),
            Status::EnrollmentFailed => StatusMessage::failure("Enrollment failed", long),
            Status::LibraryFull => StatusMessage::failure("Fingerprint library full", long),
        }
    }
}
