//! Input report parsing

use crate::{
    AnalogChannel, AuxButtons, CrossButtons, INPUT_REPORT_LEN, ProtocolError, ProtocolResult,
    REPORT_END_MARKER, REPORT_START_MARKER, RowButtons, UpDownButtons,
};
use raildriver_hid_common::ReportParser;
use serde::{Deserialize, Serialize};

/// Everything one valid input report carries, still in raw form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    pub reverser: u8,
    pub throttle: u8,
    pub train_brake: u8,
    pub independent_brake: u8,
    pub independent_brake_side: u8,
    pub wiper: u8,
    pub lights: u8,
    pub top_row: RowButtons,
    pub bottom_row: RowButtons,
    pub up_down: UpDownButtons,
    pub dpad: CrossButtons,
    pub aux: AuxButtons,
}

impl InputState {
    pub fn analog(&self, channel: AnalogChannel) -> u8 {
        match channel {
            AnalogChannel::Reverser => self.reverser,
            AnalogChannel::Throttle => self.throttle,
            AnalogChannel::TrainBrake => self.train_brake,
            AnalogChannel::IndependentBrake => self.independent_brake,
            AnalogChannel::IndependentBrakeSide => self.independent_brake_side,
            AnalogChannel::Wiper => self.wiper,
            AnalogChannel::Lights => self.lights,
        }
    }
}

pub struct InputReport;

impl InputReport {
    /// Validates `report` and unpacks it.
    ///
    /// `expected_len` is the input size the transport advertises. A length
    /// mismatch, a report shorter than the RailDriver layout, or a wrong
    /// marker at either end rejects the whole report. The end marker is the
    /// last byte whatever the advertised size.
    pub fn parse(report: &[u8], expected_len: usize) -> ProtocolResult<InputState> {
        if report.len() != expected_len || report.len() < INPUT_REPORT_LEN {
            return Err(ProtocolError::InvalidReportSize {
                expected: expected_len,
                actual: report.len(),
            });
        }

        let mut parser = ReportParser::new(report);

        let start = parser.read_u8()?;
        if start != REPORT_START_MARKER {
            return Err(ProtocolError::InvalidStartMarker(start));
        }

        let [reverser, throttle, train_brake, independent_brake, independent_brake_side, wiper, lights] =
            parser.read_array::<7>()?;
        let [b8, b9, b10, b11, b12, b13] = parser.read_array::<6>()?;
        parser.skip(parser.remaining().saturating_sub(1));

        let end = parser.read_u8()?;
        if end != REPORT_END_MARKER {
            return Err(ProtocolError::InvalidEndMarker(end));
        }

        let top = u16::from(b8) | (u16::from(b9 & 0x3F) << 8);
        let bottom = u16::from(b9 >> 6) | (u16::from(b10) << 2) | (u16::from(b11 & 0x0F) << 10);
        let up_down = (b11 >> 4) & 0x03;
        let dpad = (b11 >> 6) | ((b12 & 0x03) << 2);
        let aux = u16::from(b12 >> 2) | (u16::from(b13 & 0x0F) << 6);

        Ok(InputState {
            reverser,
            throttle,
            train_brake,
            independent_brake,
            independent_brake_side,
            wiper,
            lights,
            top_row: RowButtons::from_bits_truncate(top),
            bottom_row: RowButtons::from_bits_truncate(bottom),
            up_down: UpDownButtons::from_bits_truncate(up_down),
            dpad: CrossButtons::from_bits_truncate(dpad),
            aux: AuxButtons::from_bits_truncate(aux),
        })
    }
}
