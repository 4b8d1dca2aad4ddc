//! Byte-at-a-time decoder for tag reader frames.
//!
//! The tag reader emits one fixed-size frame per tag presentation:
//!
//! ```text
//! ┌─────┬────────┬──────────────────────┬──────────┬─────┐
//! │ STX │ 2 data │ 8 ASCII-hex tag digit│ 2 chksum │ ETX │
//! │ 0x02│        │ offsets 3..=10       │          │ 0x03│
//! └─────┴────────┴──────────────────────┴──────────┴─────┘
//!   0     1-2      3-10                   11-12      13
//! ```
//!
//! The two checksum bytes are carried but not validated.
//!
//! # State machine
//!
//! ```text
//!            STX                           ETX at offset 13
//! ┌──────┐ ───────> ┌────────────┐ ──────────────────────────> tag value
//! │ Idle │          │ Collecting │
//! └──────┘ <─────── └────────────┘
//!    ^   early ETX / 14th byte not ETX / non-hex digit
//!    │
//!    └── any byte other than STX while idle: InvalidByte
//! ```
//!
//! Every error leaves the decoder idle with an empty buffer. An STX byte
//! always restarts the frame, even in the middle of one.

use gatepost_core::constants::{
    END_BYTE, START_BYTE, TAG_DIGITS_LEN, TAG_DIGITS_OFFSET, TAG_FRAME_LEN,
};
use thiserror::Error;

/// Framing failures. Each one discards the partial frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A byte that cannot appear where it arrived: a stray byte outside any
    /// frame, or a non-hex character in the tag-digit field.
    #[error("Invalid byte 0x{byte:02X} at offset {position}")]
    InvalidByte { byte: u8, position: usize },

    /// The buffer filled up without ETX in the last position.
    #[error("Frame exceeds {} bytes", TAG_FRAME_LEN)]
    BufferOverflow,

    /// ETX arrived before the frame reached its full size.
    #[error("Incomplete frame: ETX after {received} of {} bytes", TAG_FRAME_LEN)]
    IncompleteFrame { received: usize },
}

/// Current phase of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// No frame open; waiting for STX.
    Idle,
    /// Inside a frame; the payload holds this many bytes (STX included).
    Collecting(usize),
}

/// Fixed-capacity buffer holding one frame under assembly.
///
/// The length never exceeds [`TAG_FRAME_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFrame {
    bytes: [u8; TAG_FRAME_LEN],
    len: usize,
}

impl TagFrame {
    pub fn new() -> Self {
        Self {
            bytes: [0; TAG_FRAME_LEN],
            len: 0,
        }
    }

    /// Append a byte. Returns `false` and leaves the frame untouched when full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.bytes[self.len] = byte;
        self.len += 1;
        true
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == TAG_FRAME_LEN
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// The eight tag digits, once the frame is complete.
    pub fn tag_digits(&self) -> Option<&[u8]> {
        self.is_full()
            .then(|| &self.bytes[TAG_DIGITS_OFFSET..TAG_DIGITS_OFFSET + TAG_DIGITS_LEN])
    }
}

impl Default for TagFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateful decoder turning the tag reader's byte stream into tag values.
///
/// # Example
///
/// ```
/// use gatepost_protocol::{FrameDecoder, FrameError};
///
/// let mut decoder = FrameDecoder::new();
///
/// // ETX after only four bytes
/// assert_eq!(decoder.feed(0x02), Ok(None));
/// decoder.feed(b'0').unwrap();
/// decoder.feed(b'0').unwrap();
/// assert_eq!(
///     decoder.feed(0x03),
///     Err(FrameError::IncompleteFrame { received: 4 })
/// );
/// assert!(decoder.is_idle());
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    frame: TagFrame,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            frame: TagFrame::new(),
        }
    }

    /// Consume one byte from the reader.
    ///
    /// Returns `Ok(Some(tag))` when the byte completes a valid frame,
    /// `Ok(None)` while a frame is still being assembled.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the byte makes the current frame
    /// malformed. The decoder is idle again afterwards.
    pub fn feed(&mut self, byte: u8) -> Result<Option<u32>, FrameError> {
        if byte == START_BYTE {
            self.frame.clear();
            self.frame.push(byte);
            return Ok(None);
        }

        if self.frame.is_empty() {
            return Err(FrameError::InvalidByte { byte, position: 0 });
        }

        let position = self.frame.len();
        let last = TAG_FRAME_LEN - 1;

        if byte == END_BYTE {
            if position < last {
                self.frame.clear();
                return Err(FrameError::IncompleteFrame {
                    received: position + 1,
                });
            }
            self.frame.push(byte);
            let tag = self.extract_tag();
            self.frame.clear();
            return tag.map(Some);
        }

        if position == last {
            self.frame.clear();
            return Err(FrameError::BufferOverflow);
        }

        if is_digit_offset(position) && !byte.is_ascii_hexdigit() {
            self.frame.clear();
            return Err(FrameError::InvalidByte { byte, position });
        }

        self.frame.push(byte);
        Ok(None)
    }

    pub fn state(&self) -> DecoderState {
        if self.frame.is_empty() {
            DecoderState::Idle
        } else {
            DecoderState::Collecting(self.frame.len())
        }
    }

    pub fn is_idle(&self) -> bool {
        self.frame.is_empty()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.frame.clear();
    }

    fn extract_tag(&self) -> Result<u32, FrameError> {
        let digits = self.frame.tag_digits().ok_or(FrameError::IncompleteFrame {
            received: self.frame.len(),
        })?;
        parse_hex_digits(digits)
    }
}

/// Decode one complete frame held in memory.
///
/// An STX inside the slice restarts the frame, as it does for the streaming
/// decoder.
///
/// # Errors
///
/// Returns the first framing error encountered, or `IncompleteFrame` if the
/// slice ends before a frame completes.
///
/// # Example
///
/// ```
/// use gatepost_protocol::decode_frame;
///
/// assert_eq!(decode_frame(b"\x02000033291B00\x03"), Ok(3_350_811));
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<u32, FrameError> {
    let mut decoder = FrameDecoder::new();

    for &byte in bytes {
        if let Some(tag) = decoder.feed(byte)? {
            return Ok(tag);
        }
    }

    Err(FrameError::IncompleteFrame {
        received: match decoder.state() {
            DecoderState::Idle => 0,
            DecoderState::Collecting(n) => n,
        },
    })
}

/// Build the frame a reader emits for `tag`.
///
/// The data bytes are `'0'` and the checksum is the XOR of the tag
/// bytes, rendered as two hex digits.
///
/// # Example
///
/// ```
/// use gatepost_protocol::{decode_frame, encode_frame};
///
/// let frame = encode_frame(0x0033_291B);
/// assert_eq!(&frame[3..11], b"0033291B");
/// assert_eq!(decode_frame(&frame), Ok(0x0033_291B));
/// ```
pub fn encode_frame(tag: u32) -> [u8; TAG_FRAME_LEN] {
    let body = format!("00{tag:08X}");
    let checksum = tag.to_be_bytes().iter().fold(0u8, |acc, b| acc ^ b);
    let checksum = format!("{checksum:02X}");

    let mut frame = [0u8; TAG_FRAME_LEN];
    frame[0] = START_BYTE;
    frame[1..11].copy_from_slice(body.as_bytes());
    frame[11..13].copy_from_slice(checksum.as_bytes());
    frame[TAG_FRAME_LEN - 1] = END_BYTE;
    frame
}

fn is_digit_offset(position: usize) -> bool {
    (TAG_DIGITS_OFFSET..TAG_DIGITS_OFFSET + TAG_DIGITS_LEN).contains(&position)
}

fn parse_hex_digits(digits: &[u8]) -> Result<u32, FrameError> {
    digits.iter().enumerate().try_fold(0u32, |acc, (i, &b)| {
        let nibble = (b as char).to_digit(16).ok_or(FrameError::InvalidByte {
            byte: b,
            position: TAG_DIGITS_OFFSET + i,
        })?;
        Ok((acc << 4) | nibble)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn frame_with_digits(digits: &[u8; 8]) -> Vec<u8> {
        let mut frame = vec![START_BYTE, b'0', b'0'];
        frame.extend_from_slice(digits);
        frame.extend_from_slice(b"7C");
        frame.push(END_BYTE);
        frame
    }

    #[test]
    fn test_decode_reference_tag() {
        let frame = frame_with_digits(b"0033291B");
        assert_eq!(frame.len(), TAG_FRAME_LEN);
        assert_eq!(decode_frame(&frame), Ok(3_350_811));
    }

    #[rstest]
    #[case(b"00000000", 0)]
    #[case(b"FFFFFFFF", u32::MAX)]
    #[case(b"0033291b", 0x0033_291B)]
    #[case(b"00E25A19", 0x00E2_5A19)]
    fn test_decode_hex_digits(#[case] digits: &[u8; 8], #[case] expected: u32) {
        assert_eq!(decode_frame(&frame_with_digits(digits)), Ok(expected));
    }

    #[test]
    fn test_checksum_bytes_are_not_validated() {
        let mut frame = frame_with_digits(b"0033291B");
        frame[11] = b'Z';
        frame[12] = 0xFF;
        assert_eq!(decode_frame(&frame), Ok(3_350_811));
    }

    #[test]
    fn test_early_etx_is_incomplete() {
        let mut decoder = FrameDecoder::new();
        for &b in &[START_BYTE, b'0', b'0', b'1', b'2'] {
            assert_eq!(decoder.feed(b), Ok(None));
        }
        assert_eq!(
            decoder.feed(END_BYTE),
            Err(FrameError::IncompleteFrame { received: 6 })
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_missing_etx_overflows() {
        let mut decoder = FrameDecoder::new();
        let mut frame = frame_with_digits(b"0033291B");
        frame[13] = b'0';

        let results: Vec<_> = frame.iter().map(|&b| decoder.feed(b)).collect();
        assert!(results[..13].iter().all(|r| *r == Ok(None)));
        assert_eq!(results[13], Err(FrameError::BufferOverflow));
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_non_hex_digit_is_invalid_byte() {
        let mut decoder = FrameDecoder::new();
        for &b in &[START_BYTE, b'0', b'0', b'0'] {
            decoder.feed(b).unwrap();
        }
        assert_eq!(
            decoder.feed(b'G'),
            Err(FrameError::InvalidByte {
                byte: b'G',
                position: 4
            })
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_byte_outside_frame_is_invalid() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder.feed(b'A'),
            Err(FrameError::InvalidByte {
                byte: b'A',
                position: 0
            })
        );
        assert_eq!(
            decoder.feed(END_BYTE),
            Err(FrameError::InvalidByte {
                byte: END_BYTE,
                position: 0
            })
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_stx_restarts_frame() {
        let mut decoder = FrameDecoder::new();
        for &b in &[START_BYTE, b'1', b'2', b'3'] {
            decoder.feed(b).unwrap();
        }
        assert_eq!(decoder.state(), DecoderState::Collecting(4));

        let frame = frame_with_digits(b"0000002A");
        let mut tag = None;
        for &b in &frame {
            if let Some(value) = decoder.feed(b).unwrap() {
                tag = Some(value);
            }
        }
        assert_eq!(tag, Some(42));
        assert_eq!(decoder.state(), DecoderState::Idle);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut decoder = FrameDecoder::new();
        let mut stream = frame_with_digits(b"00000001");
        stream.extend(frame_with_digits(b"00000002"));

        let tags: Vec<u32> = stream
            .iter()
            .filter_map(|&b| decoder.feed(b).unwrap())
            .collect();
        assert_eq!(tags, vec![1, 2]);
    }

    #[test]
    fn test_tag_frame_capacity() {
        let mut frame = TagFrame::new();
        for i in 0..TAG_FRAME_LEN {
            assert!(frame.push(i as u8));
        }
        assert!(frame.is_full());
        assert!(!frame.push(0xAA));
        assert_eq!(frame.len(), TAG_FRAME_LEN);
        assert_eq!(frame.tag_digits().map(<[u8]>::len), Some(TAG_DIGITS_LEN));

        frame.clear();
        assert!(frame.is_empty());
        assert_eq!(frame.tag_digits(), None);
    }

    #[test]
    fn test_decode_frame_truncated_slice() {
        let frame = frame_with_digits(b"0033291B");
        assert_eq!(
            decode_frame(&frame[..9]),
            Err(FrameError::IncompleteFrame { received: 9 })
        );
        assert_eq!(decode_frame(&[]), Err(FrameError::IncompleteFrame { received: 0 }));
    }
}
