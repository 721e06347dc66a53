//! Political-lean score parsing and classification.
//!
//! Scores are strings like `"30R"` (magnitude 30, right-leaning) or `"12D"`.
//! An empty string, `"0"`, or anything malformed is a neutral center score.

use serde::{Deserialize, Serialize};

/// Magnitudes below this are bucketed as center regardless of direction.
pub const CENTER_THRESHOLD: u32 = 10;

/// Midpoint of the 0..100 visual spectrum.
pub const SPECTRUM_MIDPOINT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Center,
    Right,
}

/// The three groups every commentator is partitioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Left,
    Center,
    Right,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Left, Bucket::Center, Bucket::Right];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Left => "left",
            Bucket::Center => "center",
            Bucket::Right => "right",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeanScore {
    pub magnitude: u32,
    pub direction: Direction,
}

impl LeanScore {
    pub const CENTER: LeanScore = LeanScore {
        magnitude: 0,
        direction: Direction::Center,
    };

    /// Center when the direction is center or the magnitude is under
    /// [`CENTER_THRESHOLD`], whatever the letter says.
    #[must_use]
    pub fn is_center(&self) -> bool {
        self.direction == Direction::Center || self.magnitude < CENTER_THRESHOLD
    }

    #[must_use]
    pub fn bucket(&self) -> Bucket {
        if self.is_center() {
            return Bucket::Center;
        }
        match self.direction {
            Direction::Left => Bucket::Left,
            Direction::Right => Bucket::Right,
            Direction::Center => Bucket::Center,
        }
    }

    /// Linear position on the spectrum. Not clamped: magnitudes above 50
    /// land past the visual edge.
    #[must_use]
    pub fn position(&self) -> i64 {
        let magnitude = i64::from(self.magnitude);
        match self.direction {
            Direction::Left => SPECTRUM_MIDPOINT - magnitude,
            Direction::Right => SPECTRUM_MIDPOINT + magnitude,
            Direction::Center => SPECTRUM_MIDPOINT,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        if self.is_center() {
            return "Center";
        }
        let strength = if self.magnitude >= 40 {
            2
        } else if self.magnitude >= 25 {
            1
        } else {
            0
        };
        match (self.direction, strength) {
            (Direction::Left, 2) => "Far Left",
            (Direction::Left, 1) => "Left",
            (Direction::Left, _) => "Center-Left",
            (Direction::Right, 2) => "Far Right",
            (Direction::Right, 1) => "Right",
            (Direction::Right, _) => "Center-Right",
            (Direction::Center, _) => "Center",
        }
    }
}

/// Parse a raw score string. Never fails: anything that is not
/// `<digits><D|R>` (case-insensitive) is treated as center. Magnitudes too
/// large for `u32` saturate at `u32::MAX`.
#[must_use]
pub fn parse_score(raw: &str) -> LeanScore {
    if raw.is_empty() || raw == "0" {
        return LeanScore::CENTER;
    }

    let Some(letter) = raw.chars().last() else {
        return LeanScore::CENTER;
    };
    let digits = &raw[..raw.len() - letter.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return LeanScore::CENTER;
    }

    let direction = match letter.to_ascii_uppercase() {
        'D' => Direction::Left,
        'R' => Direction::Right,
        _ => return LeanScore::CENTER,
    };

    // All-digit input only fails to parse on overflow; saturate.
    let magnitude = digits.parse::<u32>().unwrap_or(u32::MAX);
    LeanScore {
        magnitude,
        direction,
    }
}

#[must_use]
pub fn spectrum_position(raw: &str) -> i64 {
    parse_score(raw).position()
}

#[must_use]
pub fn lean_label(raw: &str) -> &'static str {
    parse_score(raw).label()
}
