//! Packet framing of the R30x serial protocol.
//!
//! Every exchange with the module is a command packet answered by an
//! acknowledge packet:
//!
//! ```text
//! +--------+----------+-----+--------+-----------------+----------+
//! | EF 01  | address  | PID | length | payload         | checksum |
//! | 2 B    | 4 B (BE) | 1 B | 2 B BE | length - 2 B    | 2 B BE   |
//! +--------+----------+-----+--------+-----------------+----------+
//! ```
//!
//! `length` counts the payload plus the checksum. The checksum is the low 16
//! bits of the sum of the PID, both length bytes and every payload byte.
//! The first payload byte of a command is the instruction code; the first
//! payload byte of an acknowledgement is the confirmation code.

use std::fmt;
use thiserror::Error;

/// Start of every packet.
pub const HEADER: [u8; 2] = [0xEF, 0x01];

/// Address the modules answer to out of the factory.
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Header, address, PID and length.
pub const HEAD_LEN: usize = 9;

/// Largest payload the modules send (one data packet).
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Errors in packets received from the module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("Bad packet header {0:02X?}")]
    BadHeader([u8; 2]),

    #[error("Unknown packet identifier 0x{0:02X}")]
    UnknownKind(u8),

    #[error("Packet length {0} out of range")]
    BadLength(usize),

    #[error("Checksum mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    ChecksumMismatch { computed: u16, received: u16 },

    #[error("Packet truncated: expected {expected} bytes, got {received}")]
    Truncated { expected: usize, received: usize },

    #[error("Packet from address 0x{received:08X}, expected 0x{expected:08X}")]
    AddressMismatch { expected: u32, received: u32 },

    #[error("Expected an acknowledgement, got {0:?}")]
    UnexpectedKind(PacketKind),

    #[error("Acknowledgement without confirmation code")]
    EmptyAck,
}

/// Packet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Command,
    Data,
    Ack,
    EndData,
}

impl PacketKind {
    pub fn as_u8(&self) -> u8 {
        match self {
            PacketKind::Command => 0x01,
            PacketKind::Data => 0x02,
            PacketKind::Ack => 0x07,
            PacketKind::EndData => 0x08,
        }
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(PacketKind::Command),
            0x02 => Ok(PacketKind::Data),
            0x07 => Ok(PacketKind::Ack),
            0x08 => Ok(PacketKind::EndData),
            other => Err(PacketError::UnknownKind(other)),
        }
    }
}

/// Instruction codes used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Capture an image into the image buffer.
    GenImg,
    /// Extract features of the image buffer into a character buffer.
    Img2Tz,
    /// Search the library for the features in a character buffer.
    Search,
    /// Combine both character buffers into a model.
    RegModel,
    /// Write a character buffer to a library page.
    Store,
    /// Read a library page into a character buffer.
    LoadChar,
    /// Check the module password.
    VfyPwd,
    /// Number of stored templates.
    TemplateNum,
}

impl Instruction {
    pub fn as_u8(&self) -> u8 {
        match self {
            Instruction::GenImg => 0x01,
            Instruction::Img2Tz => 0x02,
            Instruction::Search => 0x04,
            Instruction::RegModel => 0x05,
            Instruction::Store => 0x06,
            Instruction::LoadChar => 0x07,
            Instruction::VfyPwd => 0x13,
            Instruction::TemplateNum => 0x1D,
        }
    }
}

/// Confirmation code of an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Confirmation(pub u8);

impl Confirmation {
    pub const OK: Confirmation = Confirmation(0x00);
    pub const RECEIVE_ERROR: Confirmation = Confirmation(0x01);
    pub const NO_FINGER: Confirmation = Confirmation(0x02);
    pub const IMAGE_FAILED: Confirmation = Confirmation(0x03);
    pub const IMAGE_MESSY: Confirmation = Confirmation(0x06);
    pub const FEATURE_FAIL: Confirmation = Confirmation(0x07);
    pub const NOT_FOUND: Confirmation = Confirmation(0x09);
    pub const ENROLL_MISMATCH: Confirmation = Confirmation(0x0A);
    pub const BAD_LOCATION: Confirmation = Confirmation(0x0B);
    pub const READ_TEMPLATE_FAILED: Confirmation = Confirmation(0x0C);
    pub const FLASH_ERROR: Confirmation = Confirmation(0x18);
    pub const WRONG_PASSWORD: Confirmation = Confirmation(0x13);
    pub const INVALID_IMAGE: Confirmation = Confirmation(0x15);

    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }

    /// Datasheet description of the code.
    pub fn describe(&self) -> &'static str {
        match *self {
            Self::OK => "ok",
            Self::RECEIVE_ERROR => "error receiving packet",
            Self::NO_FINGER => "no finger on sensor",
            Self::IMAGE_FAILED => "failed to capture image",
            Self::IMAGE_MESSY => "image too messy",
            Self::FEATURE_FAIL => "too few feature points",
            Self::NOT_FOUND => "no matching template",
            Self::ENROLL_MISMATCH => "failed to combine character files",
            Self::BAD_LOCATION => "page id beyond library",
            Self::READ_TEMPLATE_FAILED => "error reading template or template invalid",
            Self::FLASH_ERROR => "error writing flash",
            Self::WRONG_PASSWORD => "wrong password",
            Self::INVALID_IMAGE => "no valid primary image",
            _ => "unknown confirmation code",
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.describe(), self.0)
    }
}

/// One protocol packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub address: u32,
    pub kind: PacketKind,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a command packet.
    pub fn command(address: u32, instruction: Instruction, params: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(1 + params.len());
        payload.push(instruction.as_u8());
        payload.extend_from_slice(params);
        Self {
            address,
            kind: PacketKind::Command,
            payload,
        }
    }

    /// Build an acknowledgement packet.
    pub fn ack(address: u32, confirmation: Confirmation, data: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(1 + data.len());
        payload.push(confirmation.0);
        payload.extend_from_slice(data);
        Self {
            address,
            kind: PacketKind::Ack,
            payload,
        }
    }

    fn length_field(&self) -> u16 {
        (self.payload.len() + 2) as u16
    }

    /// 16-bit sum over PID, length and payload.
    pub fn checksum(&self) -> u16 {
        let length = self.length_field().to_be_bytes();
        std::iter::once(self.kind.as_u8())
            .chain(length)
            .chain(self.payload.iter().copied())
            .fold(0u16, |acc, b| acc.wrapping_add(u16::from(b)))
    }

    /// Wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEAD_LEN + self.payload.len() + 2);
        bytes.extend_from_slice(&HEADER);
        bytes.extend_from_slice(&self.address.to_be_bytes());
        bytes.push(self.kind.as_u8());
        bytes.extend_from_slice(&self.length_field().to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(&self.checksum().to_be_bytes());
        bytes
    }

    /// Parse the fixed head of a packet.
    ///
    /// Returns the address, the packet kind and the number of bytes still
    /// to read (payload plus checksum).
    pub fn decode_head(head: &[u8; HEAD_LEN]) -> Result<(u32, PacketKind, usize), PacketError> {
        if head[..2] != HEADER {
            return Err(PacketError::BadHeader([head[0], head[1]]));
        }

        let address = u32::from_be_bytes([head[2], head[3], head[4], head[5]]);
        let kind = PacketKind::try_from(head[6])?;
        let remaining = usize::from(u16::from_be_bytes([head[7], head[8]]));

        if !(2..=MAX_PAYLOAD_LEN + 2).contains(&remaining) {
            return Err(PacketError::BadLength(remaining));
        }

        Ok((address, kind, remaining))
    }

    /// Assemble a packet from its decoded head and the remaining bytes,
    /// verifying the checksum.
    pub fn decode_body(address: u32, kind: PacketKind, body: &[u8]) -> Result<Self, PacketError> {
        if body.len() < 2 {
            return Err(PacketError::Truncated {
                expected: 2,
                received: body.len(),
            });
        }

        let (payload, sum) = body.split_at(body.len() - 2);
        let packet = Self {
            address,
            kind,
            payload: payload.to_vec(),
        };

        let received = u16::from_be_bytes([sum[0], sum[1]]);
        let computed = packet.checksum();
        if computed != received {
            return Err(PacketError::ChecksumMismatch { computed, received });
        }

        Ok(packet)
    }

    /// Parse one complete packet.
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        let head: &[u8; HEAD_LEN] =
            bytes
                .get(..HEAD_LEN)
                .and_then(|h| h.try_into().ok())
                .ok_or(PacketError::Truncated {
                    expected: HEAD_LEN,
                    received: bytes.len(),
                })?;

        let (address, kind, remaining) = Self::decode_head(head)?;
        let body = &bytes[HEAD_LEN..];
        if body.len() != remaining {
            return Err(PacketError::Truncated {
                expected: HEAD_LEN + remaining,
                received: bytes.len(),
            });
        }

        Self::decode_body(address, kind, body)
    }

    /// Confirmation code and data of an acknowledgement.
    pub fn confirmation(&self) -> Result<(Confirmation, &[u8]), PacketError> {
        if self.kind != PacketKind::Ack {
            return Err(PacketError::UnexpectedKind(self.kind));
        }

        match self.payload.split_first() {
            Some((code, data)) => Ok((Confirmation(*code), data)),
            None => Err(PacketError::EmptyAck),
        }
    }
}
