//! Contactless tag reader devices for the gatepost terminal.
//!
//! The reader modules used with the terminal are dumb serial devices: they
//! print one STX…ETX frame per tag and never expect anything back. This
//! crate only moves those bytes from the port into the pipeline; framing is
//! done by `gatepost_protocol::FrameDecoder`.
//!
//! For the mock reader used in development and testing, see
//! `gatepost_hardware::mock::MockTagReader`.

mod serial;

pub use serial::{PendingRead, SerialTagReader, SerialTagReaderConfig};
