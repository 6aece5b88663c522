//! Output report builders
//!
//! Byte 0 stays zero (report id), byte 1 carries the command. Every other
//! byte the command does not use is zero.

use crate::{LED_COMMAND, ProtocolResult, SPEAKER_COMMAND, Segment};
use raildriver_hid_common::ReportBuilder;

const COMMAND_OFFSET: usize = 1;
const LED_RIGHT_OFFSET: usize = 2;
const LED_CENTER_OFFSET: usize = 3;
const LED_LEFT_OFFSET: usize = 4;
const SPEAKER_STATE_OFFSET: usize = 7;

/// Segment patterns for the three digits, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedFrame {
    pub left: Segment,
    pub center: Segment,
    pub right: Segment,
}

impl LedFrame {
    pub const BLANK: LedFrame = LedFrame {
        left: Segment::empty(),
        center: Segment::empty(),
        right: Segment::empty(),
    };

    pub fn new(left: Segment, center: Segment, right: Segment) -> Self {
        Self {
            left,
            center,
            right,
        }
    }

    /// Builds a frame from up to three codes, padding on the right with blanks.
    pub fn from_codes(codes: &[Segment]) -> Self {
        let mut it = codes.iter().copied();
        Self {
            left: it.next().unwrap_or_default(),
            center: it.next().unwrap_or_default(),
            right: it.next().unwrap_or_default(),
        }
    }

    /// The same pattern on every digit.
    pub fn uniform(code: Segment) -> Self {
        Self::new(code, code, code)
    }
}

/// Frame that lights `frame` on the LED display.
///
/// The device expects the digits in right, center, left order.
pub fn led_report(output_len: usize, frame: LedFrame) -> ProtocolResult<Vec<u8>> {
    let mut builder = ReportBuilder::new(output_len);
    builder
        .put_u8(COMMAND_OFFSET, LED_COMMAND)?
        .put_u8(LED_RIGHT_OFFSET, frame.right.bits())?
        .put_u8(LED_CENTER_OFFSET, frame.center.bits())?
        .put_u8(LED_LEFT_OFFSET, frame.left.bits())?;
    Ok(builder.into_inner())
}

pub fn speaker_report(output_len: usize, enabled: bool) -> ProtocolResult<Vec<u8>> {
    let mut builder = ReportBuilder::new(output_len);
    builder
        .put_u8(COMMAND_OFFSET, SPEAKER_COMMAND)?
        .put_u8(SPEAKER_STATE_OFFSET, u8::from(enabled))?;
    Ok(builder.into_inner())
}
