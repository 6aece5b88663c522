//! Digital control flag sets
//!
//! Each group is a `bitflags` set over the bit positions the panel packs into
//! bytes 8..=13 of the input report. Bits outside a group's width are never
//! produced by the decoder.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// One of the two 14-button rows. `BUTTON_1` is the leftmost button.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RowButtons: u16 {
        const BUTTON_1 = 1 << 0;
        const BUTTON_2 = 1 << 1;
        const BUTTON_3 = 1 << 2;
        const BUTTON_4 = 1 << 3;
        const BUTTON_5 = 1 << 4;
        const BUTTON_6 = 1 << 5;
        const BUTTON_7 = 1 << 6;
        const BUTTON_8 = 1 << 7;
        const BUTTON_9 = 1 << 8;
        const BUTTON_10 = 1 << 9;
        const BUTTON_11 = 1 << 10;
        const BUTTON_12 = 1 << 11;
        const BUTTON_13 = 1 << 12;
        const BUTTON_14 = 1 << 13;
    }
}

impl RowButtons {
    /// Looks up a button by its 1-based position from the left.
    pub fn button(index: usize) -> Option<Self> {
        if (1..=14).contains(&index) {
            let bit = 1u16.checked_shl(u32::try_from(index.saturating_sub(1)).ok()?)?;
            Self::from_bits(bit)
        } else {
            None
        }
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        Self::button(index).is_some_and(|b| self.contains(b))
    }
}

bitflags! {
    /// The rocker switch between the two rows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct UpDownButtons: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
    }
}

bitflags! {
    /// The D-pad. Opposite directions can be reported together, diagonals
    /// arrive as two adjacent bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CrossButtons: u8 {
        const UP = 1 << 0;
        const RIGHT = 1 << 1;
        const DOWN = 1 << 2;
        const LEFT = 1 << 3;
    }
}

bitflags! {
    /// Rocker and push buttons around the levers.
    ///
    /// With many other aux buttons held the panel can report `HORN_UP` and
    /// `HORN_DOWN` at the same time even though the lever cannot be in both
    /// positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AuxButtons: u16 {
        const RANGE_UP = 1 << 0;
        const RANGE_DOWN = 1 << 1;
        const E_UP = 1 << 2;
        const E_DOWN = 1 << 3;
        const ALERT = 1 << 4;
        const SAND = 1 << 5;
        const P = 1 << 6;
        const BELL = 1 << 7;
        const HORN_UP = 1 << 8;
        const HORN_DOWN = 1 << 9;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_widths() {
        assert_eq!(RowButtons::all().bits(), 0x3FFF);
        assert_eq!(UpDownButtons::all().bits(), 0x03);
        assert_eq!(CrossButtons::all().bits(), 0x0F);
        assert_eq!(AuxButtons::all().bits(), 0x03FF);
    }

    #[test]
    fn test_row_button_lookup() {
        assert_eq!(RowButtons::button(1), Some(RowButtons::BUTTON_1));
        assert_eq!(RowButtons::button(14), Some(RowButtons::BUTTON_14));
        assert_eq!(RowButtons::button(0), None);
        assert_eq!(RowButtons::button(15), None);

        let row = RowButtons::BUTTON_3 | RowButtons::BUTTON_12;
        assert!(row.is_pressed(3));
        assert!(row.is_pressed(12));
        assert!(!row.is_pressed(4));
    }

    #[test]
    fn test_truncate_drops_unknown_bits() {
        assert_eq!(RowButtons::from_bits_truncate(0xFFFF), RowButtons::all());
        assert_eq!(AuxButtons::from_bits_truncate(0x0400), AuxButtons::empty());
    }
}
