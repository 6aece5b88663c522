//! Full calibration set and its persisted form

use crate::{
    AnalogControl, CalibratedValue, CalibrationError, CalibrationResult, IndependentBrakeBounds,
    ReverserBounds, ReverserPosition, ThrottleBounds, TrainBrakeBounds, TriButtonBounds,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::warn;

/// Size of the persisted form. There is no header or version byte.
pub const ENCODED_LEN: usize = 18;

/// Bounds for every calibrated control.
///
/// Persisted as the raw threshold bytes in a fixed order: reverser (3),
/// throttle (4), train brake (3), independent brake (2), wiper (3), lights
/// (3). AutoTune flags are runtime state and are not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalibrationData {
    pub reverser: ReverserBounds,
    pub throttle: ThrottleBounds,
    pub train_brake: TrainBrakeBounds,
    pub independent_brake: IndependentBrakeBounds,
    pub wiper: TriButtonBounds,
    pub lights: TriButtonBounds,
}

impl CalibrationData {
    pub fn curve_mut(&mut self, control: AnalogControl) -> &mut dyn CalibratedValue {
        match control {
            AnalogControl::Reverser => &mut self.reverser,
            AnalogControl::Throttle => &mut self.throttle,
            AnalogControl::TrainBrake => &mut self.train_brake,
            AnalogControl::IndependentBrake => &mut self.independent_brake,
            AnalogControl::Wiper => &mut self.wiper,
            AnalogControl::Lights => &mut self.lights,
        }
    }

    pub fn curve(&self, control: AnalogControl) -> &dyn CalibratedValue {
        match control {
            AnalogControl::Reverser => &self.reverser,
            AnalogControl::Throttle => &self.throttle,
            AnalogControl::TrainBrake => &self.train_brake,
            AnalogControl::IndependentBrake => &self.independent_brake,
            AnalogControl::Wiper => &self.wiper,
            AnalogControl::Lights => &self.lights,
        }
    }

    pub fn value(&mut self, control: AnalogControl, raw: u8) -> f64 {
        self.curve_mut(control).value(raw)
    }

    pub fn reverser_position(&mut self, raw: u8) -> ReverserPosition {
        ReverserPosition::from_value(self.reverser.value(raw))
    }

    pub fn set_auto_tune(&mut self, enabled: bool) {
        for control in AnalogControl::ALL {
            self.curve_mut(control).set_auto_tune(enabled);
        }
    }

    /// Validates one control's bounds.
    pub fn validate_control(&self, control: AnalogControl) -> CalibrationResult<()> {
        self.curve(control).validate(control)
    }

    /// First ordering violation across all controls, in persisted order.
    pub fn validate(&self) -> CalibrationResult<()> {
        AnalogControl::ALL
            .into_iter()
            .try_for_each(|control| self.validate_control(control))
    }

    /// Replaces every record whose bounds are out of order with its defaults.
    pub fn sanitized(mut self) -> Self {
        for control in AnalogControl::ALL {
            if let Err(e) = self.validate_control(control) {
                warn!(error = %e, "Replacing calibration with defaults");
                self.reset_control(control);
            }
        }
        self
    }

    /// Restores one control's default bounds, keeping its AutoTune flag.
    pub fn reset_control(&mut self, control: AnalogControl) {
        let auto_tune = self.curve(control).auto_tune();
        match control {
            AnalogControl::Reverser => self.reverser = ReverserBounds::default(),
            AnalogControl::Throttle => self.throttle = ThrottleBounds::default(),
            AnalogControl::TrainBrake => self.train_brake = TrainBrakeBounds::default(),
            AnalogControl::IndependentBrake => {
                self.independent_brake = IndependentBrakeBounds::default();
            }
            AnalogControl::Wiper => self.wiper = TriButtonBounds::default(),
            AnalogControl::Lights => self.lights = TriButtonBounds::default(),
        }
        self.curve_mut(control).set_auto_tune(auto_tune);
    }

    pub fn to_bytes(&self) -> [u8; ENCODED_LEN] {
        let r = &self.reverser;
        let t = &self.throttle;
        let b = &self.train_brake;
        let i = &self.independent_brake;
        let w = &self.wiper;
        let l = &self.lights;
        [
            r.pos_reverse,
            r.pos_forward,
            r.pos_neutral,
            t.max_throttle,
            t.min_throttle,
            t.max_brake,
            t.min_brake,
            b.brake_min,
            b.brake_max,
            b.brake_emg,
            i.brake_min,
            i.brake_max,
            w.min,
            w.max,
            w.middle,
            l.min,
            l.max,
            l.middle,
        ]
    }

    /// Decodes the first [`ENCODED_LEN`] bytes of `bytes`. Anything after them
    /// is ignored. AutoTune comes back off.
    pub fn from_bytes(bytes: &[u8]) -> CalibrationResult<Self> {
        let block = bytes
            .first_chunk::<ENCODED_LEN>()
            .ok_or(CalibrationError::Truncated {
                expected: ENCODED_LEN,
                actual: bytes.len(),
            })?;

        let [
            pos_reverse,
            pos_forward,
            pos_neutral,
            max_throttle,
            min_throttle,
            max_brake,
            min_brake,
            train_min,
            train_max,
            brake_emg,
            ind_min,
            ind_max,
            wiper_min,
            wiper_max,
            wiper_middle,
            lights_min,
            lights_max,
            lights_middle,
        ] = *block;

        Ok(Self {
            reverser: ReverserBounds {
                pos_reverse,
                pos_forward,
                pos_neutral,
                auto_tune: false,
            },
            throttle: ThrottleBounds {
                max_throttle,
                min_throttle,
                max_brake,
                min_brake,
                auto_tune: false,
            },
            train_brake: TrainBrakeBounds {
                brake_min: train_min,
                brake_max: train_max,
                brake_emg,
                auto_tune: false,
            },
            independent_brake: IndependentBrakeBounds {
                brake_min: ind_min,
                brake_max: ind_max,
                auto_tune: false,
            },
            wiper: TriButtonBounds {
                min: wiper_min,
                max: wiper_max,
                middle: wiper_middle,
                auto_tune: false,
            },
            lights: TriButtonBounds {
                min: lights_min,
                max: lights_max,
                middle: lights_middle,
                auto_tune: false,
            },
        })
    }

    /// Reads exactly [`ENCODED_LEN`] bytes from `source`.
    pub fn read_from<R: Read>(source: &mut R) -> CalibrationResult<Self> {
        let mut buf = [0u8; ENCODED_LEN];
        let mut filled = 0usize;
        while let Some(rest) = buf.get_mut(filled..) {
            if rest.is_empty() {
                break;
            }
            match source.read(rest) {
                Ok(0) => {
                    return Err(CalibrationError::Truncated {
                        expected: ENCODED_LEN,
                        actual: filled,
                    });
                }
                Ok(n) => filled = filled.saturating_add(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Self::from_bytes(&buf)
    }

    pub fn write_to<W: Write>(&self, destination: &mut W) -> CalibrationResult<()> {
        destination.write_all(&self.to_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tuned() -> CalibrationData {
        let mut data = CalibrationData::default();
        data.reverser.pos_reverse = 230;
        data.throttle.max_brake = 50;
        data.train_brake.brake_min = 210;
        data.independent_brake.brake_max = 30;
        data.wiper.middle = 130;
        data.lights.max = 190;
        data
    }

    #[test]
    fn test_default_bytes_layout() {
        let bytes = CalibrationData::default().to_bytes();
        assert_eq!(
            bytes,
            [
                221, 67, 115, 226, 176, 59, 123, 204, 84, 70, 199, 37, 86, 180, 135, 86, 180, 135
            ]
        );
    }

    #[test]
    fn test_round_trip() -> CalibrationResult<()> {
        let data = tuned();
        let mut buf = Vec::new();
        data.write_to(&mut buf)?;
        assert_eq!(buf.len(), ENCODED_LEN);

        let back = CalibrationData::read_from(&mut Cursor::new(buf))?;
        assert_eq!(back, data);
        Ok(())
    }

    #[test]
    fn test_read_stops_at_record_end() -> CalibrationResult<()> {
        let mut bytes = tuned().to_bytes().to_vec();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let mut cursor = Cursor::new(bytes);

        let back = CalibrationData::read_from(&mut cursor)?;
        assert_eq!(back, tuned());
        assert_eq!(cursor.position(), 18);
        Ok(())
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let bytes = tuned().to_bytes();
        let result = CalibrationData::read_from(&mut Cursor::new(&bytes[..10]));
        assert!(matches!(
            result,
            Err(CalibrationError::Truncated {
                expected: 18,
                actual: 10
            })
        ));
        assert!(CalibrationData::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_auto_tune_not_persisted() -> CalibrationResult<()> {
        let mut data = tuned();
        data.set_auto_tune(true);
        assert!(data.throttle.auto_tune);

        let back = CalibrationData::from_bytes(&data.to_bytes())?;
        assert!(!back.throttle.auto_tune);
        assert!(!back.lights.auto_tune);
        Ok(())
    }

    #[test]
    fn test_dispatch_and_auto_tune() {
        let mut data = CalibrationData::default();
        assert!((data.value(AnalogControl::TrainBrake, 50) + 1.0).abs() < f64::EPSILON);
        assert_eq!(data.reverser_position(221), ReverserPosition::Reverse);
        assert_eq!(data.reverser_position(115), ReverserPosition::Neutral);
        assert_eq!(data.reverser_position(67), ReverserPosition::Forward);

        data.set_auto_tune(true);
        let _ = data.value(AnalogControl::Wiper, 200);
        assert_eq!(data.wiper.max, 200);
        assert_eq!(data.lights.max, 180);
    }

    #[test]
    fn test_validate_names_the_tri_button() {
        let mut data = CalibrationData::default();
        data.lights.middle = 200;
        assert!(matches!(
            data.validate(),
            Err(CalibrationError::InvalidBounds {
                control: AnalogControl::Lights,
                ..
            })
        ));
    }

    #[test]
    fn test_sanitized_resets_only_invalid_records() {
        let mut data = tuned();
        data.train_brake.brake_min = 10;
        data.set_auto_tune(true);

        let clean = data.sanitized();
        assert_eq!(clean.train_brake.brake_min, 204);
        assert!(clean.train_brake.auto_tune);
        assert_eq!(clean.reverser.pos_reverse, 230);
        assert!(clean.validate().is_ok());
    }
}
