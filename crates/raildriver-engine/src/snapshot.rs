//! Calibrated view of one decode cycle

use raildriver_calibration::{AnalogControl, CalibrationData, ReverserPosition};
use raildriver_protocol::{
    AnalogChannel, AuxButtons, ChangeSet, CrossButtons, InputState, RowButtons, UpDownButtons,
};
use serde::Serialize;

/// A calibrated reading next to the byte it came from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizedValue {
    pub processed: f64,
    pub raw: u8,
}

impl NormalizedValue {
    pub fn new(processed: f64, raw: u8) -> Self {
        Self { processed, raw }
    }
}

/// Every control at one decode cycle. Never mutated after it is published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub reverser: NormalizedValue,
    pub throttle: NormalizedValue,
    pub train_brake: NormalizedValue,
    pub independent_brake: NormalizedValue,
    /// Uncalibrated.
    pub independent_brake_side: u8,
    pub wiper: NormalizedValue,
    pub lights: NormalizedValue,
    pub reverser_position: ReverserPosition,
    pub top_row: RowButtons,
    pub bottom_row: RowButtons,
    pub up_down: UpDownButtons,
    pub dpad: CrossButtons,
    pub aux: AuxButtons,
}

/// Calibration curve for a report channel. The side axis has none.
pub fn control_for(channel: AnalogChannel) -> Option<AnalogControl> {
    match channel {
        AnalogChannel::Reverser => Some(AnalogControl::Reverser),
        AnalogChannel::Throttle => Some(AnalogControl::Throttle),
        AnalogChannel::TrainBrake => Some(AnalogControl::TrainBrake),
        AnalogChannel::IndependentBrake => Some(AnalogControl::IndependentBrake),
        AnalogChannel::IndependentBrakeSide => None,
        AnalogChannel::Wiper => Some(AnalogControl::Wiper),
        AnalogChannel::Lights => Some(AnalogControl::Lights),
    }
}

impl DeviceSnapshot {
    /// Builds the snapshot for `changes`.
    ///
    /// Only analog channels flagged as changed go through `calibration`;
    /// the rest keep their value from `previous`. Without a previous
    /// snapshot every channel is evaluated.
    pub fn from_changes(
        previous: Option<&DeviceSnapshot>,
        changes: &ChangeSet,
        calibration: &mut CalibrationData,
    ) -> Self {
        let state = &changes.state;
        let mut eval = |control: AnalogControl, raw: u8| match previous {
            Some(prev) if !changes.changed.has(channel_for(control).field()) => prev.value(control),
            _ => NormalizedValue::new(calibration.value(control, raw), raw),
        };

        let reverser = eval(AnalogControl::Reverser, state.reverser);
        let throttle = eval(AnalogControl::Throttle, state.throttle);
        let train_brake = eval(AnalogControl::TrainBrake, state.train_brake);
        let independent_brake = eval(AnalogControl::IndependentBrake, state.independent_brake);
        let wiper = eval(AnalogControl::Wiper, state.wiper);
        let lights = eval(AnalogControl::Lights, state.lights);

        Self {
            reverser,
            throttle,
            train_brake,
            independent_brake,
            independent_brake_side: state.independent_brake_side,
            wiper,
            lights,
            reverser_position: ReverserPosition::from_value(reverser.processed),
            top_row: state.top_row,
            bottom_row: state.bottom_row,
            up_down: state.up_down,
            dpad: state.dpad,
            aux: state.aux,
        }
    }

    pub fn value(&self, control: AnalogControl) -> NormalizedValue {
        match control {
            AnalogControl::Reverser => self.reverser,
            AnalogControl::Throttle => self.throttle,
            AnalogControl::TrainBrake => self.train_brake,
            AnalogControl::IndependentBrake => self.independent_brake,
            AnalogControl::Wiper => self.wiper,
            AnalogControl::Lights => self.lights,
        }
    }

    /// The raw input the snapshot was built from.
    pub fn input_state(&self) -> InputState {
        InputState {
            reverser: self.reverser.raw,
            throttle: self.throttle.raw,
            train_brake: self.train_brake.raw,
            independent_brake: self.independent_brake.raw,
            independent_brake_side: self.independent_brake_side,
            wiper: self.wiper.raw,
            lights: self.lights.raw,
            top_row: self.top_row,
            bottom_row: self.bottom_row,
            up_down: self.up_down,
            dpad: self.dpad,
            aux: self.aux,
        }
    }
}

fn channel_for(control: AnalogControl) -> AnalogChannel {
    match control {
        AnalogControl::Reverser => AnalogChannel::Reverser,
        AnalogControl::Throttle => AnalogChannel::Throttle,
        AnalogControl::TrainBrake => AnalogChannel::TrainBrake,
        AnalogControl::IndependentBrake => AnalogChannel::IndependentBrake,
        AnalogControl::Wiper => AnalogChannel::Wiper,
        AnalogControl::Lights => AnalogChannel::Lights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raildriver_protocol::{InputField, InputFields};

    fn idle_state() -> InputState {
        InputState {
            reverser: 115,
            throttle: 150,
            train_brake: 204,
            independent_brake: 199,
            independent_brake_side: 128,
            wiper: 135,
            lights: 135,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_snapshot_evaluates_every_channel() {
        let mut calibration = CalibrationData::default();
        let changes = ChangeSet {
            changed: InputFields::REVERSER,
            state: idle_state(),
        };
        let snap = DeviceSnapshot::from_changes(None, &changes, &mut calibration);

        assert_eq!(snap.train_brake.raw, 204);
        assert!(snap.train_brake.processed.abs() < f64::EPSILON);
        assert!((snap.independent_brake.processed).abs() < f64::EPSILON);
        assert_eq!(snap.reverser_position, ReverserPosition::Neutral);
        assert_eq!(snap.independent_brake_side, 128);
        assert_eq!(snap.input_state(), idle_state());
    }

    #[test]
    fn test_unchanged_channels_keep_previous_value() {
        let mut calibration = CalibrationData::default();
        let first = DeviceSnapshot::from_changes(
            None,
            &ChangeSet {
                changed: InputFields::ANALOG,
                state: idle_state(),
            },
            &mut calibration,
        );

        // A stale previous value proves the throttle was not recomputed.
        let mut previous = first.clone();
        previous.throttle = NormalizedValue::new(0.75, 200);

        let mut state = idle_state();
        state.reverser = 67;
        let next = DeviceSnapshot::from_changes(
            Some(&previous),
            &ChangeSet {
                changed: InputField::Reverser.flag(),
                state,
            },
            &mut calibration,
        );

        assert_eq!(next.throttle, NormalizedValue::new(0.75, 200));
        assert!((next.reverser.processed - 1.0).abs() < f64::EPSILON);
        assert_eq!(next.reverser_position, ReverserPosition::Forward);
    }

    #[test]
    fn test_digital_sets_copied_verbatim() {
        let mut calibration = CalibrationData::default();
        let mut state = idle_state();
        state.top_row = RowButtons::BUTTON_1 | RowButtons::BUTTON_14;
        state.aux = AuxButtons::HORN_UP;
        let snap = DeviceSnapshot::from_changes(
            None,
            &ChangeSet {
                changed: InputFields::TOP_ROW | InputFields::AUX,
                state,
            },
            &mut calibration,
        );
        assert_eq!(snap.top_row, RowButtons::BUTTON_1 | RowButtons::BUTTON_14);
        assert_eq!(snap.aux, AuxButtons::HORN_UP);
    }

    #[test]
    fn test_auto_tune_runs_only_for_changed_channels() {
        let mut calibration = CalibrationData::default();
        calibration.set_auto_tune(true);

        let mut state = idle_state();
        state.throttle = 240;
        state.wiper = 200;
        let first = DeviceSnapshot::from_changes(
            None,
            &ChangeSet {
                changed: InputFields::ANALOG,
                state,
            },
            &mut calibration,
        );
        assert_eq!(calibration.throttle.max_throttle, 240);

        state.wiper = 220;
        state.throttle = 250;
        let _ = DeviceSnapshot::from_changes(
            Some(&first),
            &ChangeSet {
                changed: InputFields::WIPER,
                state,
            },
            &mut calibration,
        );
        assert_eq!(calibration.wiper.max, 220);
        assert_eq!(calibration.throttle.max_throttle, 240);
    }

    #[test]
    fn test_control_mapping() {
        assert_eq!(control_for(AnalogChannel::IndependentBrakeSide), None);
        for control in AnalogControl::ALL {
            assert_eq!(control_for(channel_for(control)), Some(control));
        }
    }
}
