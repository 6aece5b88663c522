//! Wire protocol for the RailDriver desktop train cab controller
//!
//! The panel enumerates as a PIE HID device and streams one fixed 15-byte
//! input report per poll:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | start marker `0x00` (report id slot) |
//! | 1..=7 | analog: reverser, throttle, train brake, independent brake, independent brake side, wiper, lights |
//! | 8..=13 | digital: top row, bottom row, up/down, D-pad, aux buttons (bit packed) |
//! | 14 | end marker `0x35` |
//!
//! Output reports are 9 bytes with a command byte at offset 1. This crate
//! holds the layout knowledge only; nothing here performs I/O.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod buttons;
pub mod decoder;
pub mod input;
pub mod output;
pub mod segment;
pub mod types;

pub use buttons::*;
pub use decoder::*;
pub use input::*;
pub use output::*;
pub use segment::Segment;
pub use types::*;

use raildriver_hid_common::HidCommonError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid report size: expected {expected}, got {actual}")]
    InvalidReportSize { expected: usize, actual: usize },

    #[error("Invalid start marker: expected 0x00, got 0x{0:02x}")]
    InvalidStartMarker(u8),

    #[error("Invalid end marker: expected 0x35, got 0x{0:02x}")]
    InvalidEndMarker(u8),

    #[error("HID error: {0}")]
    HidError(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<HidCommonError> for ProtocolError {
    fn from(e: HidCommonError) -> Self {
        match e {
            HidCommonError::InvalidReportSize { expected, actual } => {
                ProtocolError::InvalidReportSize { expected, actual }
            }
            other => ProtocolError::HidError(other.to_string()),
        }
    }
}

/// P.I. Engineering vendor id shared by every PIE device.
pub const PIE_VENDOR_ID: u16 = 0x05F3;

pub const INPUT_REPORT_LEN: usize = 15;
pub const OUTPUT_REPORT_LEN: usize = 9;

pub const REPORT_START_MARKER: u8 = 0x00;
pub const REPORT_END_MARKER: u8 = 0x35;

pub const LED_COMMAND: u8 = 0x86;
pub const SPEAKER_COMMAND: u8 = 0x85;

/// Number of 7-segment digits on the panel.
pub const LED_DIGITS: usize = 3;
