//! Value types exchanged with peripherals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Outcome of polling the fingerprint sensor for an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture<I> {
    /// A finger is on the sensor and an image was taken.
    Image(I),

    /// Nothing on the sensor. This is the idle case, not an error.
    NoFinger,
}

impl<I> Capture<I> {
    pub fn is_image(&self) -> bool {
        matches!(self, Capture::Image(_))
    }
}

/// Sensor-side buffer receiving the features of one image.
///
/// Enrollment extracts the two images of a finger into slots one and two
/// before combining them; identification only uses slot one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureSlot {
    One,
    Two,
}

impl FeatureSlot {
    /// Buffer number as sent to the sensor.
    pub fn as_u8(&self) -> u8 {
        match self {
            FeatureSlot::One => 1,
            FeatureSlot::Two => 2,
        }
    }
}

/// Occupancy of a template slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    Occupied,
    Free,
}

/// Visual weight of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Normal,
    Success,
    Failure,
}

impl fmt::Display for Emphasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emphasis::Normal => write!(f, "normal"),
            Emphasis::Success => write!(f, "success"),
            Emphasis::Failure => write!(f, "failure"),
        }
    }
}

/// A short message for the terminal's display.
///
/// `duration` is how long the message should stay up before the terminal
/// moves on; zero means "until replaced".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub emphasis: Emphasis,
    pub duration: Duration,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, emphasis: Emphasis, duration: Duration) -> Self {
        Self {
            text: text.into(),
            emphasis,
            duration,
        }
    }

    pub fn normal(text: impl Into<String>, duration: Duration) -> Self {
        Self::new(text, Emphasis::Normal, duration)
    }

    pub fn success(text: impl Into<String>, duration: Duration) -> Self {
        Self::new(text, Emphasis::Success, duration)
    }

    pub fn failure(text: impl Into<String>, duration: Duration) -> Self {
        Self::new(text, Emphasis::Failure, duration)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.emphasis, self.text)
    }
}
