//! Fixed parameters of the credential pipeline.
//!
//! The values here describe the tag-reader wire format, the timing of the
//! pipeline, and the layout of the fingerprint template store. They are
//! compile-time constants on purpose: the terminal firmware never changes
//! them at run time.
//!
//! # Tag frame layout
//!
//! ```text
//! offset  0    1  2    3 .. 10          11 12   13
//!        STX  data   8 ASCII-hex digits  chk    ETX
//!        0x02                                   0x03
//! ```

// ============================================================================
// Tag frame
// ============================================================================

/// Start-of-text marker opening every tag frame.
pub const START_BYTE: u8 = 0x02;

/// End-of-text marker closing every tag frame.
pub const END_BYTE: u8 = 0x03;

/// Total length of a tag frame, STX and ETX included.
pub const TAG_FRAME_LEN: usize = 14;

/// Offset of the first ASCII-hex tag digit inside a frame.
pub const TAG_DIGITS_OFFSET: usize = 3;

/// Number of ASCII-hex tag digits.
pub const TAG_DIGITS_LEN: usize = 8;

// ============================================================================
// Timing
// ============================================================================

/// Minimum interval between two admitted credential events, in milliseconds.
///
/// Shared by tag and biometric presentations.
///
/// # Examples
///
/// ```
/// use gatepost_core::constants::DEBOUNCE_COOLDOWN_MS;
/// use std::time::Duration;
///
/// let window = Duration::from_millis(DEBOUNCE_COOLDOWN_MS);
/// assert_eq!(window.as_secs(), 6);
/// ```
pub const DEBOUNCE_COOLDOWN_MS: u64 = 6000;

/// How long the gate relay is held active for one opening, in milliseconds.
pub const GATE_HOLD_MS: u64 = 5000;

/// Pause after a brief status message (read errors, prompts).
pub const STATUS_SHORT_MS: u64 = 1500;

/// Pause after an outcome message (granted, denied, enrollment result).
pub const STATUS_LONG_MS: u64 = 3000;

/// Default scheduler tick, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Default timeout for the remote reporting call, in milliseconds.
pub const DEFAULT_REPORT_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// Credentials
// ============================================================================

/// Tag value that starts fingerprint enrollment instead of a normal report.
pub const ADMIN_TAG: u32 = 0x00E2_5A19;

/// Lowest template slot used by the fingerprint store.
pub const MIN_TEMPLATE_ID: u16 = 1;

/// Highest template slot probed during enrollment.
pub const MAX_TEMPLATE_ID: u16 = 127;

/// Display name the remote authority returns when no record matches.
pub const USER_NOT_FOUND: &str = "user not found";
