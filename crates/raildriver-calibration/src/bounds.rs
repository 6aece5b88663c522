//! Per-control calibration bounds and their curves
//!
//! Raw readings grow in a fixed direction per lever: towards "reverse" on the
//! reverser, towards "throttle" on the combined throttle/dynamic brake, and
//! towards "release" on both brakes.

use crate::{AnalogControl, CalibratedValue, CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};

/// `num / den`, or 0.0 when the two bounds coincide.
fn ratio(num: i32, den: i32) -> f64 {
    if den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

fn invalid(control: AnalogControl, reason: &'static str) -> CalibrationError {
    CalibrationError::InvalidBounds { control, reason }
}

/// Reverser lever: -1.0 full reverse, 0.0 neutral, 1.0 full forward.
///
/// # Examples
///
/// ```
/// use raildriver_calibration::{CalibratedValue, ReverserBounds};
///
/// let mut reverser = ReverserBounds::default();
/// assert!((reverser.value(115) - 0.0).abs() < f64::EPSILON);
/// assert!((reverser.value(240) + 1.0).abs() < f64::EPSILON);
/// assert!((reverser.value(10) - 1.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverserBounds {
    pub pos_reverse: u8,
    pub pos_forward: u8,
    pub pos_neutral: u8,
    #[serde(skip)]
    pub auto_tune: bool,
}

impl Default for ReverserBounds {
    fn default() -> Self {
        Self {
            pos_reverse: 221,
            pos_forward: 67,
            pos_neutral: 115,
            auto_tune: false,
        }
    }
}

impl CalibratedValue for ReverserBounds {
    fn value(&mut self, raw: u8) -> f64 {
        if raw > self.pos_reverse {
            if !self.auto_tune {
                return -1.0;
            }
            self.pos_reverse = raw;
        }
        if raw < self.pos_forward {
            if !self.auto_tune {
                return 1.0;
            }
            self.pos_forward = raw;
        }

        let raw = i32::from(raw);
        let reverse = i32::from(self.pos_reverse);
        let forward = i32::from(self.pos_forward);
        let neutral = i32::from(self.pos_neutral);

        if raw > neutral {
            -ratio(raw - neutral, reverse - neutral)
        } else {
            1.0 - ratio(raw - forward, neutral - forward)
        }
    }

    fn auto_tune(&self) -> bool {
        self.auto_tune
    }

    fn set_auto_tune(&mut self, enabled: bool) {
        self.auto_tune = enabled;
    }

    fn validate(&self, control: AnalogControl) -> CalibrationResult<()> {
        if self.pos_forward >= self.pos_neutral {
            return Err(invalid(control, "pos_forward must be below pos_neutral"));
        }
        if self.pos_neutral >= self.pos_reverse {
            return Err(invalid(control, "pos_neutral must be below pos_reverse"));
        }
        Ok(())
    }
}

/// Combined throttle and dynamic brake lever.
///
/// Throttle notches give 0.0..=1.0, the brake side -1.0..=0.0, and the gap
/// between `min_brake` and `min_throttle` is the idle detent at 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleBounds {
    pub max_throttle: u8,
    pub min_throttle: u8,
    pub max_brake: u8,
    pub min_brake: u8,
    #[serde(skip)]
    pub auto_tune: bool,
}

impl Default for ThrottleBounds {
    fn default() -> Self {
        Self {
            max_throttle: 226,
            min_throttle: 176,
            max_brake: 59,
            min_brake: 123,
            auto_tune: false,
        }
    }
}

impl CalibratedValue for ThrottleBounds {
    fn value(&mut self, raw: u8) -> f64 {
        if raw > self.max_throttle {
            if !self.auto_tune {
                return 1.0;
            }
            self.max_throttle = raw;
        }
        if raw < self.max_brake {
            if !self.auto_tune {
                return -1.0;
            }
            self.max_brake = raw;
        }

        let v = i32::from(raw);
        if raw <= self.min_brake {
            let max_brake = i32::from(self.max_brake);
            return -1.0 + ratio(v - max_brake, i32::from(self.min_brake) - max_brake);
        }
        if raw > self.min_throttle {
            let min_throttle = i32::from(self.min_throttle);
            return ratio(v - min_throttle, i32::from(self.max_throttle) - min_throttle);
        }
        0.0
    }

    fn auto_tune(&self) -> bool {
        self.auto_tune
    }

    fn set_auto_tune(&mut self, enabled: bool) {
        self.auto_tune = enabled;
    }

    fn validate(&self, control: AnalogControl) -> CalibrationResult<()> {
        if self.max_brake >= self.min_brake {
            return Err(invalid(control, "max_brake must be below min_brake"));
        }
        if self.min_brake > self.min_throttle {
            return Err(invalid(control, "min_brake must not be above min_throttle"));
        }
        if self.min_throttle >= self.max_throttle {
            return Err(invalid(control, "min_throttle must be below max_throttle"));
        }
        Ok(())
    }
}

/// Automatic (train) brake: 0.0 released, 1.0 full service, -1.0 emergency.
///
/// Emergency is checked before anything else. AutoTune only ever extends
/// `brake_min`; moving `brake_max` down would swallow the emergency zone.
///
/// # Examples
///
/// ```
/// use raildriver_calibration::{CalibratedValue, TrainBrakeBounds};
///
/// let mut brake = TrainBrakeBounds::default();
/// assert!((brake.value(50) + 1.0).abs() < f64::EPSILON);
/// assert!((brake.value(80) - 1.0).abs() < f64::EPSILON);
/// assert!((brake.value(230) - 0.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainBrakeBounds {
    pub brake_min: u8,
    pub brake_max: u8,
    pub brake_emg: u8,
    #[serde(skip)]
    pub auto_tune: bool,
}

impl Default for TrainBrakeBounds {
    fn default() -> Self {
        Self {
            brake_min: 204,
            brake_max: 84,
            brake_emg: 70,
            auto_tune: false,
        }
    }
}

impl CalibratedValue for TrainBrakeBounds {
    fn value(&mut self, raw: u8) -> f64 {
        if raw < self.brake_emg {
            return -1.0;
        }
        if raw > self.brake_min {
            if !self.auto_tune {
                return 0.0;
            }
            self.brake_min = raw;
        }
        if raw < self.brake_max {
            return 1.0;
        }

        let max = i32::from(self.brake_max);
        1.0 - ratio(i32::from(raw) - max, i32::from(self.brake_min) - max)
    }

    fn auto_tune(&self) -> bool {
        self.auto_tune
    }

    fn set_auto_tune(&mut self, enabled: bool) {
        self.auto_tune = enabled;
    }

    fn validate(&self, control: AnalogControl) -> CalibrationResult<()> {
        if self.brake_max >= self.brake_min {
            return Err(invalid(control, "brake_min must be above brake_max"));
        }
        if self.brake_emg > self.brake_max {
            return Err(invalid(control, "brake_emg must not be above brake_max"));
        }
        Ok(())
    }
}

/// Independent brake: 0.0 released, 1.0 full application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndependentBrakeBounds {
    pub brake_min: u8,
    pub brake_max: u8,
    #[serde(skip)]
    pub auto_tune: bool,
}

impl Default for IndependentBrakeBounds {
    fn default() -> Self {
        Self {
            brake_min: 199,
            brake_max: 37,
            auto_tune: false,
        }
    }
}

impl CalibratedValue for IndependentBrakeBounds {
    fn value(&mut self, raw: u8) -> f64 {
        if raw > self.brake_min {
            if !self.auto_tune {
                return 0.0;
            }
            self.brake_min = raw;
        }
        if raw < self.brake_max {
            if !self.auto_tune {
                return 1.0;
            }
            self.brake_max = raw;
        }

        let max = i32::from(self.brake_max);
        1.0 - ratio(i32::from(raw) - max, i32::from(self.brake_min) - max)
    }

    fn auto_tune(&self) -> bool {
        self.auto_tune
    }

    fn set_auto_tune(&mut self, enabled: bool) {
        self.auto_tune = enabled;
    }

    fn validate(&self, control: AnalogControl) -> CalibrationResult<()> {
        if self.brake_max >= self.brake_min {
            return Err(invalid(control, "brake_min must be above brake_max"));
        }
        Ok(())
    }
}

/// Half-width of the dead band around [`TriButtonBounds::middle`]. A reading
/// strictly closer than this is centered.
pub const TRI_BUTTON_DEADBAND: i32 = 15;

/// Three-position rocker read as an analog value (wiper and lights switches).
///
/// # Examples
///
/// ```
/// use raildriver_calibration::{CalibratedValue, TriButtonBounds};
///
/// let mut wiper = TriButtonBounds::default();
/// assert!((wiper.value(128) - 0.0).abs() < f64::EPSILON);
/// assert!((wiper.value(150) - 1.0).abs() < f64::EPSILON);
/// assert!((wiper.value(100) + 1.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriButtonBounds {
    pub min: u8,
    pub max: u8,
    pub middle: u8,
    #[serde(skip)]
    pub auto_tune: bool,
}

impl Default for TriButtonBounds {
    fn default() -> Self {
        Self {
            min: 86,
            max: 180,
            middle: 135,
            auto_tune: false,
        }
    }
}

impl CalibratedValue for TriButtonBounds {
    fn value(&mut self, raw: u8) -> f64 {
        if raw < self.min {
            if !self.auto_tune {
                return -1.0;
            }
            self.min = raw;
        }
        if raw > self.max {
            if !self.auto_tune {
                return 1.0;
            }
            self.max = raw;
        }

        let offset = i32::from(raw) - i32::from(self.middle);
        if offset.abs() < TRI_BUTTON_DEADBAND {
            0.0
        } else if offset < 0 {
            -1.0
        } else {
            1.0
        }
    }

    fn auto_tune(&self) -> bool {
        self.auto_tune
    }

    fn set_auto_tune(&mut self, enabled: bool) {
        self.auto_tune = enabled;
    }

    fn validate(&self, control: AnalogControl) -> CalibrationResult<()> {
        if self.min >= self.middle {
            return Err(invalid(control, "min must be below middle"));
        }
        if self.middle >= self.max {
            return Err(invalid(control, "middle must be below max"));
        }
        Ok(())
    }
}

/// Three-position view of the reverser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReverserPosition {
    Reverse = -1,
    Neutral = 0,
    Forward = 1,
}

impl ReverserPosition {
    /// Threshold either side of neutral.
    pub const THRESHOLD: f64 = 0.33;

    pub fn from_value(value: f64) -> Self {
        if value < -Self::THRESHOLD {
            ReverserPosition::Reverse
        } else if value > Self::THRESHOLD {
            ReverserPosition::Forward
        } else {
            ReverserPosition::Neutral
        }
    }

    pub fn as_i8(self) -> i8 {
        self as i8
    }
}
