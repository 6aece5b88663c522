//! Property-based tests for calibration curves, AutoTune and the persisted form.

use proptest::prelude::*;
use raildriver_calibration::{
    AnalogControl, CalibratedValue, CalibrationData, IndependentBrakeBounds, ReverserBounds,
    ThrottleBounds, TrainBrakeBounds, TriButtonBounds,
};

fn in_range(value: f64, lo: f64, hi: f64) -> bool {
    value.is_finite() && value >= lo && value <= hi
}

fn range_of(control: AnalogControl) -> (f64, f64) {
    if control == AnalogControl::IndependentBrake {
        (0.0, 1.0)
    } else {
        (-1.0, 1.0)
    }
}

prop_compose! {
    fn ordered3()(a in 0u8..=253, gap1 in 1u8..=100, gap2 in 1u8..=100) -> (u8, u8, u8) {
        let b = a.saturating_add(gap1).min(254);
        let c = b.saturating_add(gap2).max(b.saturating_add(1));
        (a, b, c)
    }
}

prop_compose! {
    fn any_calibration()(bytes in any::<[u8; 18]>()) -> CalibrationData {
        CalibrationData::from_bytes(&bytes).unwrap_or_default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // --- Defaults: every control stays in its documented range ---

    #[test]
    fn default_values_stay_in_range(raw in any::<u8>()) {
        for control in AnalogControl::ALL {
            let mut data = CalibrationData::default();
            let (lo, hi) = range_of(control);
            let value = data.value(control, raw);
            prop_assert!(in_range(value, lo, hi), "{} at {} gave {}", control, raw, value);
            prop_assert_eq!(data, CalibrationData::default());
        }
    }

    // --- Any well-ordered bounds keep the curves in range ---

    #[test]
    fn ordered_reverser_in_range((forward, neutral, reverse) in ordered3(), raw in any::<u8>()) {
        let mut bounds = ReverserBounds { pos_reverse: reverse, pos_forward: forward, pos_neutral: neutral, auto_tune: false };
        prop_assert!(bounds.validate(AnalogControl::Reverser).is_ok());
        prop_assert!(in_range(bounds.value(raw), -1.0, 1.0));
    }

    #[test]
    fn ordered_independent_brake_in_range(max in 0u8..=200, span in 1u8..=55, raw in any::<u8>()) {
        let mut bounds = IndependentBrakeBounds { brake_min: max.saturating_add(span), brake_max: max, auto_tune: false };
        prop_assert!(bounds.validate(AnalogControl::IndependentBrake).is_ok());
        prop_assert!(in_range(bounds.value(raw), 0.0, 1.0));
    }

    #[test]
    fn ordered_train_brake_in_range((emg, max, min) in ordered3(), raw in any::<u8>()) {
        let mut bounds = TrainBrakeBounds { brake_min: min, brake_max: max, brake_emg: emg, auto_tune: false };
        prop_assert!(bounds.validate(AnalogControl::TrainBrake).is_ok());
        prop_assert!(in_range(bounds.value(raw), -1.0, 1.0));
    }

    // --- Emergency wins regardless of the other bounds ---

    #[test]
    fn train_brake_below_emergency_is_minus_one(
        emg in 1u8..=255,
        min in any::<u8>(),
        max in any::<u8>(),
        auto_tune in any::<bool>(),
        below in any::<u8>(),
    ) {
        let raw = below % emg;
        let mut bounds = TrainBrakeBounds { brake_min: min, brake_max: max, brake_emg: emg, auto_tune };
        let value = bounds.value(raw);
        prop_assert!((value + 1.0).abs() < f64::EPSILON);
    }

    // --- AutoTune only ever widens, and stays valid ---

    #[test]
    fn auto_tune_widens_and_stays_ordered(raws in proptest::collection::vec(any::<u8>(), 1..64)) {
        let mut data = CalibrationData::default();
        data.set_auto_tune(true);
        for raw in raws {
            for control in AnalogControl::ALL {
                let value = data.value(control, raw);
                prop_assert!(value.is_finite());
            }
        }
        let defaults = CalibrationData::default();
        prop_assert!(data.reverser.pos_reverse >= defaults.reverser.pos_reverse);
        prop_assert!(data.reverser.pos_forward <= defaults.reverser.pos_forward);
        prop_assert!(data.throttle.max_throttle >= defaults.throttle.max_throttle);
        prop_assert!(data.throttle.max_brake <= defaults.throttle.max_brake);
        prop_assert!(data.train_brake.brake_min >= defaults.train_brake.brake_min);
        prop_assert_eq!(data.train_brake.brake_max, defaults.train_brake.brake_max);
        prop_assert!(data.validate().is_ok());
    }

    #[test]
    fn tri_button_is_three_valued(raw in any::<u8>(), auto_tune in any::<bool>()) {
        let mut bounds = TriButtonBounds { auto_tune, ..Default::default() };
        let value = bounds.value(raw);
        prop_assert!([-1.0, 0.0, 1.0].iter().any(|v: &f64| (v - value).abs() < f64::EPSILON));
    }

    // --- Persisted form ---

    #[test]
    fn bytes_round_trip(data in any_calibration()) {
        let back = CalibrationData::from_bytes(&data.to_bytes());
        prop_assert_eq!(back.ok(), Some(data));
    }

    #[test]
    fn sanitized_is_always_valid(data in any_calibration()) {
        prop_assert!(data.sanitized().validate().is_ok());
    }

    #[test]
    fn throttle_is_never_nan_even_when_inverted(bytes in any::<[u8; 4]>(), raw in any::<u8>()) {
        let [max_throttle, min_throttle, max_brake, min_brake] = bytes;
        let mut bounds = ThrottleBounds { max_throttle, min_throttle, max_brake, min_brake, auto_tune: false };
        prop_assert!(!bounds.value(raw).is_nan());
    }
}
