//! RailDriver calibration
//!
//! Every lever or switch on the panel reports a single raw byte. This crate
//! holds the per-control thresholds that turn that byte into a normalized
//! position, the curve math for each control shape, and the 18-byte file
//! format the thresholds are stored in.
//!
//! With AutoTune enabled a reading outside the stored range widens the range
//! instead of being clamped, which is why evaluating a curve takes `&mut self`.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod bounds;
pub mod data;
pub mod store;

pub use bounds::*;
pub use data::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Calibration data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Invalid {control} bounds: {reason}")]
    InvalidBounds {
        control: AnalogControl,
        reason: &'static str,
    },

    #[error("No per-user configuration directory on this platform")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// The calibrated controls. The side-to-side axis of the independent brake
/// has no curve and is not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogControl {
    Reverser,
    Throttle,
    TrainBrake,
    IndependentBrake,
    Wiper,
    Lights,
}

impl AnalogControl {
    /// In persisted order.
    pub const ALL: [AnalogControl; 6] = [
        AnalogControl::Reverser,
        AnalogControl::Throttle,
        AnalogControl::TrainBrake,
        AnalogControl::IndependentBrake,
        AnalogControl::Wiper,
        AnalogControl::Lights,
    ];
}

impl fmt::Display for AnalogControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalogControl::Reverser => "reverser",
            AnalogControl::Throttle => "throttle",
            AnalogControl::TrainBrake => "train brake",
            AnalogControl::IndependentBrake => "independent brake",
            AnalogControl::Wiper => "wiper",
            AnalogControl::Lights => "lights",
        };
        f.write_str(name)
    }
}

/// A control shape that maps one raw byte to a normalized value.
pub trait CalibratedValue {
    /// Evaluates the curve. With AutoTune on, an out-of-range `raw` first
    /// widens the violated bound.
    fn value(&mut self, raw: u8) -> f64;

    fn auto_tune(&self) -> bool;

    fn set_auto_tune(&mut self, enabled: bool);

    /// Checks the ordering the curve relies on. Errors name `control`,
    /// since the wiper and lights share one bounds type.
    fn validate(&self, control: AnalogControl) -> CalibrationResult<()>;
}
