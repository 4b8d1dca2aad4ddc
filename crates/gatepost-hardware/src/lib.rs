//! Peripheral abstraction layer for the gatepost terminal.
//!
//! This crate provides trait-based abstractions for the devices the
//! credential pipeline drives: the tag reader's serial line, the fingerprint
//! sensor, the gate relay, the status display and the exit button. The
//! traits let the pipeline run unchanged against mock devices (development
//! and testing) and real drivers (`gatepost-rfid`, `gatepost-biometric`,
//! the GPIO adapters of `gatepost-cli`).
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations use native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Generic, not dynamic**: the pipeline is generic over its devices, so
//!   the traits may use associated types (see [`BiometricSensor`]).
//! - **Non-blocking polls**: input methods report "nothing yet" instead of
//!   waiting, which keeps the single-threaded scheduler responsive.
//! - **Error-aware**: All operations return [`Result<T>`][error::Result].
//!
//! # Example
//!
//! ```no_run
//! use gatepost_hardware::traits::{Relay, StatusDisplay};
//! use gatepost_hardware::types::StatusMessage;
//! use gatepost_hardware::Result;
//! use std::time::Duration;
//!
//! async fn pulse<R: Relay, D: StatusDisplay>(relay: &mut R, display: &mut D) -> Result<()> {
//!     display.show(&StatusMessage::success("Open", Duration::from_secs(1))).await?;
//!     relay.set_active(true).await?;
//!     tokio::time::sleep(Duration::from_millis(500)).await;
//!     relay.set_active(false).await
//! }
//! ```
//!
//! [`BiometricSensor`]: traits::BiometricSensor

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{BiometricSensor, ExitButton, Relay, StatusDisplay, TagSource};
pub use types::{Capture, Emphasis, FeatureSlot, SlotStatus, StatusMessage};
