//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware. Each mock comes with
//! a handle that drives it from the outside (presenting tags, placing
//! fingers) and observes what the pipeline did to it (relay pulses,
//! displayed messages).

pub mod biometric;
pub mod button;
pub mod display;
pub mod relay;
pub mod tag;

// Re-export commonly used types
pub use biometric::{MockBiometric, MockBiometricHandle, SensorCall, SensorOp};
pub use button::{MockButton, MockButtonHandle};
pub use display::{MockDisplay, MockDisplayHandle};
pub use relay::{MockRelay, MockRelayHandle};
pub use tag::{MockTagReader, MockTagReaderHandle};
