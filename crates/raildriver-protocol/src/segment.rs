//! 7-segment encoding for the three-digit LED display
//!
//! ```text
//!    --1--
//!   |     |
//!  32     2
//!   |     |
//!    --64-
//!   |     |
//!  16     4
//!   |     |
//!    --8--  .128
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Segment: u8 {
        const TOP = 1;
        const TOP_RIGHT = 2;
        const BOTTOM_RIGHT = 4;
        const BOTTOM = 8;
        const BOTTOM_LEFT = 16;
        const TOP_LEFT = 32;
        const MIDDLE = 64;
        /// Sits to the bottom right of the digit.
        const DOT = 128;

        const LEFT = Self::TOP_LEFT.bits() | Self::BOTTOM_LEFT.bits();
        const CENTER = Self::TOP.bits() | Self::MIDDLE.bits() | Self::BOTTOM.bits();
        const RIGHT = Self::TOP_RIGHT.bits() | Self::BOTTOM_RIGHT.bits();
        /// Every bar, without the dot.
        const FULL = Self::LEFT.bits() | Self::CENTER.bits() | Self::RIGHT.bits();
    }
}

/// One lit bar cycling around the digit, shown on all three positions.
pub const LOADER_ANIMATION: [Segment; 8] = [
    Segment::TOP,
    Segment::TOP_RIGHT,
    Segment::MIDDLE,
    Segment::BOTTOM_LEFT,
    Segment::BOTTOM,
    Segment::BOTTOM_RIGHT,
    Segment::MIDDLE,
    Segment::TOP_LEFT,
];

const DIGIT_2: Segment = Segment::CENTER
    .union(Segment::TOP_RIGHT)
    .union(Segment::BOTTOM_LEFT);
const DIGIT_5: Segment = Segment::CENTER
    .union(Segment::TOP_LEFT)
    .union(Segment::BOTTOM_RIGHT);

const CHAR_MAP: [(char, Segment); 45] = [
    ('0', Segment::TOP.union(Segment::BOTTOM).union(Segment::LEFT).union(Segment::RIGHT)),
    ('1', Segment::RIGHT),
    ('2', DIGIT_2),
    ('3', Segment::CENTER.union(Segment::RIGHT)),
    ('4', Segment::TOP_LEFT.union(Segment::MIDDLE).union(Segment::RIGHT)),
    ('5', DIGIT_5),
    ('6', Segment::CENTER.union(Segment::LEFT).union(Segment::BOTTOM_RIGHT)),
    ('7', Segment::TOP.union(Segment::RIGHT)),
    ('8', Segment::FULL),
    ('9', Segment::CENTER.union(Segment::RIGHT).union(Segment::TOP_LEFT)),
    ('A', Segment::LEFT.union(Segment::RIGHT).union(Segment::TOP).union(Segment::MIDDLE)),
    ('B', Segment::LEFT.union(Segment::MIDDLE).union(Segment::BOTTOM_RIGHT).union(Segment::BOTTOM)),
    ('C', Segment::BOTTOM_LEFT.union(Segment::BOTTOM).union(Segment::MIDDLE)),
    ('D', Segment::RIGHT.union(Segment::BOTTOM_LEFT).union(Segment::MIDDLE).union(Segment::BOTTOM)),
    ('E', Segment::CENTER.union(Segment::LEFT)),
    ('F', Segment::LEFT.union(Segment::MIDDLE).union(Segment::TOP)),
    ('G', Segment::LEFT.union(Segment::TOP).union(Segment::BOTTOM).union(Segment::BOTTOM_RIGHT)),
    ('H', Segment::LEFT.union(Segment::MIDDLE).union(Segment::RIGHT)),
    ('I', Segment::LEFT),
    ('J', Segment::RIGHT.union(Segment::BOTTOM)),
    ('L', Segment::LEFT.union(Segment::BOTTOM)),
    ('N', Segment::BOTTOM_LEFT.union(Segment::BOTTOM_RIGHT).union(Segment::MIDDLE)),
    ('O', Segment::BOTTOM.union(Segment::MIDDLE).union(Segment::BOTTOM_LEFT).union(Segment::BOTTOM_RIGHT)),
    ('P', Segment::LEFT.union(Segment::TOP).union(Segment::MIDDLE).union(Segment::TOP_RIGHT)),
    ('Q', Segment::TOP_LEFT.union(Segment::TOP).union(Segment::MIDDLE).union(Segment::RIGHT)),
    ('R', Segment::BOTTOM_LEFT.union(Segment::MIDDLE)),
    ('S', DIGIT_5),
    ('T', Segment::LEFT.union(Segment::BOTTOM).union(Segment::MIDDLE)),
    ('U', Segment::LEFT.union(Segment::BOTTOM).union(Segment::RIGHT)),
    ('Y', Segment::RIGHT.union(Segment::MIDDLE).union(Segment::TOP_LEFT).union(Segment::BOTTOM)),
    ('Z', DIGIT_2),
    ('!', Segment::TOP_RIGHT.union(Segment::DOT)),
    ('"', Segment::TOP_LEFT.union(Segment::TOP_RIGHT)),
    ('\'', Segment::TOP_LEFT),
    ('(', Segment::TOP.union(Segment::BOTTOM).union(Segment::LEFT)),
    (')', Segment::TOP.union(Segment::BOTTOM).union(Segment::RIGHT)),
    (',', Segment::DOT),
    ('_', Segment::BOTTOM),
    ('-', Segment::MIDDLE),
    ('\u{af}', Segment::TOP),
    ('=', Segment::BOTTOM.union(Segment::MIDDLE)),
    ('?', Segment::TOP.union(Segment::TOP_RIGHT).union(Segment::DOT)),
    ('.', Segment::DOT),
    ('\u{b0}', Segment::TOP.union(Segment::MIDDLE).union(Segment::TOP_LEFT).union(Segment::TOP_RIGHT)),
    ('@', Segment::FULL.symmetric_difference(Segment::BOTTOM_RIGHT)),
];

/// Pattern for one character. Lookup is case-sensitive; unmapped characters
/// are blank.
pub fn encode_char(c: char) -> Segment {
    CHAR_MAP
        .iter()
        .find(|(known, _)| *known == c)
        .map(|(_, code)| *code)
        .unwrap_or_default()
}

/// Upper-cases `text`, encodes each character and folds lone dots into the
/// preceding digit.
pub fn encode_text(text: &str) -> Vec<Segment> {
    merge_dot(text.to_uppercase().chars().map(encode_char))
}

/// Folds a lone [`Segment::DOT`] into the previous code's dot bit.
///
/// The dot stays in its own position when it is first, or when the previous
/// code already has its dot lit.
pub fn merge_dot(codes: impl IntoIterator<Item = Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for code in codes {
        match out.last_mut() {
            Some(prev) if code == Segment::DOT && !prev.contains(Segment::DOT) => {
                prev.insert(Segment::DOT);
            }
            _ => out.push(code),
        }
    }
    out
}

/// Renders `value` in the form the three digits can show.
///
/// Values clamp to -99..=999. Anything that rounds to -10 or below, or to
/// 100 or above, is shown as an integer; the rest keep one decimal and are
/// left-padded to four characters so the dot folds into the middle digit.
/// Rounding is half away from zero. NaN becomes `"NAN"`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }

    let clamped = value.clamp(-99.0, 999.0);
    // Adding zero turns -0.0 into 0.0.
    let tenths = (clamped * 10.0).round() / 10.0 + 0.0;
    if tenths <= -10.0 || tenths >= 100.0 {
        return format!("{:.0}", clamped.round());
    }

    format!("{tenths:>4.1}")
}

/// Every character with a pattern.
pub fn known_characters() -> impl Iterator<Item = char> {
    CHAR_MAP.iter().map(|(c, _)| *c)
}

/// Letters A to Z that have no usable pattern.
pub fn unsupported_alpha_chars() -> impl Iterator<Item = char> {
    ('A'..='Z').filter(|c| !CHAR_MAP.iter().any(|(known, _)| known == c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_segments() {
        assert_eq!(Segment::LEFT.bits(), 48);
        assert_eq!(Segment::CENTER.bits(), 73);
        assert_eq!(Segment::RIGHT.bits(), 6);
        assert_eq!(Segment::FULL.bits(), 127);
        assert!(!Segment::FULL.contains(Segment::DOT));
    }

    #[test]
    fn test_digit_patterns() {
        assert_eq!(encode_char('0').bits(), 0x3F);
        assert_eq!(encode_char('1').bits(), 0x06);
        assert_eq!(encode_char('8'), Segment::FULL);
        assert_eq!(encode_char('S'), encode_char('5'));
        assert_eq!(encode_char('Z'), encode_char('2'));
        assert_eq!(encode_char('@').bits(), 0x7B);
    }

    #[test]
    fn test_unmapped_and_lowercase_are_blank() {
        assert_eq!(encode_char('K'), Segment::empty());
        assert_eq!(encode_char(' '), Segment::empty());
        assert_eq!(encode_char('a'), Segment::empty());
        assert_eq!(encode_text("a"), vec![encode_char('A')]);
    }

    #[test]
    fn test_merge_dot() {
        assert_eq!(encode_text("5.3"), vec![DIGIT_5 | Segment::DOT, encode_char('3')]);
        assert_eq!(encode_text(".5"), vec![Segment::DOT, DIGIT_5]);
        assert_eq!(encode_text("1.."), vec![Segment::RIGHT | Segment::DOT, Segment::DOT]);
        assert_eq!(
            encode_text("?."),
            vec![encode_char('?'), Segment::DOT],
            "previous dot already lit"
        );
        assert!(encode_text("").is_empty());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(f64::NAN), "NAN");
        assert_eq!(format_number(1000.0), "999");
        assert_eq!(format_number(f64::INFINITY), "999");
        assert_eq!(format_number(-150.0), "-99");
        assert_eq!(format_number(5.25), " 5.3");
        assert_eq!(format_number(0.0), " 0.0");
        assert_eq!(format_number(-0.04), " 0.0");
        assert_eq!(format_number(-10.0), "-10");
        assert_eq!(format_number(-10.5), "-11");
        assert_eq!(format_number(99.94), "99.9");
        assert_eq!(format_number(99.96), "100");
        assert_eq!(format_number(-9.96), "-10");
        assert_eq!(format_number(100.4), "100");
        assert_eq!(format_number(12.0), "12.0");
    }

    #[test]
    fn test_known_characters() {
        let known: Vec<char> = known_characters().collect();
        assert_eq!(known.len(), 45);
        assert!(known.contains(&'\u{b0}'));
        assert!(!known.contains(&'K'));
    }

    #[test]
    fn test_unsupported_alpha_chars() {
        let missing: String = unsupported_alpha_chars().collect();
        assert_eq!(missing, "KMVWX");
    }

    #[test]
    fn test_loader_lights_one_bar_per_step() {
        for step in LOADER_ANIMATION {
            assert_eq!(step.bits().count_ones(), 1);
            assert!(!step.contains(Segment::DOT));
        }
    }
}
