//! Wire formats spoken by the terminal.
//!
//! Two formats live here:
//!
//! - [`frame`]: the 14-byte STX/ETX frames emitted by the serial tag reader,
//!   decoded one byte at a time by [`FrameDecoder`].
//! - [`report`]: the JSON request/response exchanged with the remote
//!   authority for every credential event.
//!
//! # Example
//!
//! ```
//! use gatepost_protocol::FrameDecoder;
//!
//! let mut decoder = FrameDecoder::new();
//! let mut tag = None;
//! for &byte in b"\x02000033291B00\x03" {
//!     if let Some(value) = decoder.feed(byte).unwrap() {
//!         tag = Some(value);
//!     }
//! }
//! assert_eq!(tag, Some(0x0033_291B));
//! ```

pub mod frame;
pub mod report;

pub use frame::{DecoderState, FrameDecoder, FrameError, TagFrame, decode_frame, encode_frame};
pub use report::{AccessFlag, ReportRequest, ReportResponse, Verdict, WireError};
