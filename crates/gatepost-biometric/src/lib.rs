//! Fingerprint sensor drivers for the gatepost terminal.
//!
//! This crate provides the driver for the R30x family of optical
//! fingerprint modules (R305, R307, ZFM-20 and compatibles), which keep
//! their template library on the module and do all matching themselves.
//! For the mock sensor used in development and testing, see
//! `gatepost_hardware::mock::MockBiometric`.
//!
//! # Example
//!
//! ```no_run
//! use gatepost_biometric::{R30x, R30xConfig};
//!
//! # async fn example() -> gatepost_hardware::Result<()> {
//! let mut sensor = R30x::open("/dev/ttyS0", 57600, R30xConfig::default())?;
//! sensor.handshake().await?;
//! # Ok(())
//! # }
//! ```

pub mod packet;
mod sensor;

pub use packet::{Confirmation, Instruction, Packet, PacketError, PacketKind};
pub use sensor::{CharBuffer, ImageBuffer, ModelBuffer, R30x, R30xConfig};
