//! Credential pipeline of the gatepost terminal.
//!
//! This crate holds the terminal's logic, independent of any concrete
//! device:
//!
//! - [`debounce`]: minimum spacing between accepted credentials
//! - [`lock`]: exclusion flag held during decisions and enrollment
//! - [`enrollment`]: admin-triggered fingerprint enrollment state machine
//! - [`decision`]: reporting events and interpreting the authority's answer
//! - [`gate`]: timed relay pulse
//! - [`status`]: messages shown to the person at the terminal
//! - [`pipeline`]: the single owner tying all of the above together
//!
//! # Example
//!
//! ```no_run
//! use gatepost_core::DeviceIdentity;
//! use gatepost_hardware::mock::{MockBiometric, MockButton, MockDisplay, MockRelay, MockTagReader};
//! use gatepost_network::mock::MockReporter;
//! use gatepost_terminal::{Devices, Pipeline, PipelineConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (tags, _line) = MockTagReader::new();
//! let (sensor, _) = MockBiometric::new();
//! let (relay, _) = MockRelay::new();
//! let (display, _) = MockDisplay::new();
//! let (reporter, _) = MockReporter::new();
//! let (button, _) = MockButton::new();
//!
//! let devices = Devices { tags, sensor, relay, display, reporter };
//! let identity = DeviceIdentity::new("lobby-east")?;
//! let mut pipeline = Pipeline::new(devices, identity, PipelineConfig::default());
//!
//! pipeline
//!     .run(Some(button), Duration::from_millis(50), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod debounce;
pub mod decision;
pub mod enrollment;
pub mod gate;
pub mod lock;
pub mod pipeline;
pub mod status;

pub use debounce::DebounceGate;
pub use decision::{DecisionClient, Outcome};
pub use enrollment::{EnrollmentSession, EnrollmentStage};
pub use gate::GateActuator;
pub use lock::ProcessingLock;
pub use pipeline::{Devices, Pipeline, PipelineConfig};
pub use status::Status;
