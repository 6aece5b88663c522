//! Channel and field identifiers

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Analog controls in report order. Each occupies one byte at `offset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogChannel {
    Reverser,
    Throttle,
    TrainBrake,
    IndependentBrake,
    /// Side-to-side (bail-off) movement of the independent brake lever. Worn
    /// levers drift on this axis while only moving up and down.
    IndependentBrakeSide,
    Wiper,
    Lights,
}

impl AnalogChannel {
    pub const ALL: [AnalogChannel; 7] = [
        AnalogChannel::Reverser,
        AnalogChannel::Throttle,
        AnalogChannel::TrainBrake,
        AnalogChannel::IndependentBrake,
        AnalogChannel::IndependentBrakeSide,
        AnalogChannel::Wiper,
        AnalogChannel::Lights,
    ];

    /// Byte offset within the input report.
    pub fn offset(self) -> usize {
        match self {
            AnalogChannel::Reverser => 1,
            AnalogChannel::Throttle => 2,
            AnalogChannel::TrainBrake => 3,
            AnalogChannel::IndependentBrake => 4,
            AnalogChannel::IndependentBrakeSide => 5,
            AnalogChannel::Wiper => 6,
            AnalogChannel::Lights => 7,
        }
    }

    pub fn field(self) -> InputField {
        match self {
            AnalogChannel::Reverser => InputField::Reverser,
            AnalogChannel::Throttle => InputField::Throttle,
            AnalogChannel::TrainBrake => InputField::TrainBrake,
            AnalogChannel::IndependentBrake => InputField::IndependentBrake,
            AnalogChannel::IndependentBrakeSide => InputField::IndependentBrakeSide,
            AnalogChannel::Wiper => InputField::Wiper,
            AnalogChannel::Lights => InputField::Lights,
        }
    }
}

/// A decoded field that can be reported as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputField {
    Reverser,
    Throttle,
    TrainBrake,
    IndependentBrake,
    IndependentBrakeSide,
    Wiper,
    Lights,
    TopRow,
    BottomRow,
    UpDown,
    DPad,
    Aux,
}

impl InputField {
    /// Every field, in the order changes are detected.
    pub const ALL: [InputField; 12] = [
        InputField::Reverser,
        InputField::Throttle,
        InputField::TrainBrake,
        InputField::IndependentBrake,
        InputField::IndependentBrakeSide,
        InputField::Wiper,
        InputField::Lights,
        InputField::TopRow,
        InputField::BottomRow,
        InputField::UpDown,
        InputField::DPad,
        InputField::Aux,
    ];

    pub fn flag(self) -> InputFields {
        match self {
            InputField::Reverser => InputFields::REVERSER,
            InputField::Throttle => InputFields::THROTTLE,
            InputField::TrainBrake => InputFields::TRAIN_BRAKE,
            InputField::IndependentBrake => InputFields::INDEPENDENT_BRAKE,
            InputField::IndependentBrakeSide => InputFields::INDEPENDENT_BRAKE_SIDE,
            InputField::Wiper => InputFields::WIPER,
            InputField::Lights => InputFields::LIGHTS,
            InputField::TopRow => InputFields::TOP_ROW,
            InputField::BottomRow => InputFields::BOTTOM_ROW,
            InputField::UpDown => InputFields::UP_DOWN,
            InputField::DPad => InputFields::DPAD,
            InputField::Aux => InputFields::AUX,
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputField::Reverser => "reverser",
            InputField::Throttle => "throttle",
            InputField::TrainBrake => "train_brake",
            InputField::IndependentBrake => "independent_brake",
            InputField::IndependentBrakeSide => "independent_brake_side",
            InputField::Wiper => "wiper",
            InputField::Lights => "lights",
            InputField::TopRow => "top_row",
            InputField::BottomRow => "bottom_row",
            InputField::UpDown => "up_down",
            InputField::DPad => "dpad",
            InputField::Aux => "aux",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Set of [`InputField`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InputFields: u16 {
        const REVERSER = 1 << 0;
        const THROTTLE = 1 << 1;
        const TRAIN_BRAKE = 1 << 2;
        const INDEPENDENT_BRAKE = 1 << 3;
        const INDEPENDENT_BRAKE_SIDE = 1 << 4;
        const WIPER = 1 << 5;
        const LIGHTS = 1 << 6;
        const TOP_ROW = 1 << 7;
        const BOTTOM_ROW = 1 << 8;
        const UP_DOWN = 1 << 9;
        const DPAD = 1 << 10;
        const AUX = 1 << 11;

        const ANALOG = Self::REVERSER.bits()
            | Self::THROTTLE.bits()
            | Self::TRAIN_BRAKE.bits()
            | Self::INDEPENDENT_BRAKE.bits()
            | Self::INDEPENDENT_BRAKE_SIDE.bits()
            | Self::WIPER.bits()
            | Self::LIGHTS.bits();
        const DIGITAL = Self::TOP_ROW.bits()
            | Self::BOTTOM_ROW.bits()
            | Self::UP_DOWN.bits()
            | Self::DPAD.bits()
            | Self::AUX.bits();
    }
}

impl InputFields {
    pub fn has(&self, field: InputField) -> bool {
        self.contains(field.flag())
    }

    pub fn insert_field(&mut self, field: InputField) {
        self.insert(field.flag());
    }

    /// Member fields in detection order.
    pub fn fields(&self) -> impl Iterator<Item = InputField> + '_ {
        InputField::ALL.into_iter().filter(|f| self.has(*f))
    }
}

impl From<InputField> for InputFields {
    fn from(field: InputField) -> Self {
        field.flag()
    }
}
