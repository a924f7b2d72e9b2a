//! Compass Octants
//!
//! The eight throwing directions and the exact classifier that decides
//! which octant (if any) a target lies in relative to a thrower.
//!
//! Codes run clockwise from north: `N=0, NE=1, E=2, SE=3, S=4, SW=5,
//! W=6, NW=7`. Only targets exactly on an axis or a 45° diagonal belong
//! to an octant; everything else is unreachable.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::point::Point;

/// Number of compass octants.
pub const OCTANT_COUNT: u8 = 8;

/// One of the eight compass octants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// North (+y)
    N = 0,
    /// North-east (+x, +y)
    NE = 1,
    /// East (+x)
    E = 2,
    /// South-east (+x, -y)
    SE = 3,
    /// South (-y)
    S = 4,
    /// South-west (-x, -y)
    SW = 5,
    /// West (-x)
    W = 6,
    /// North-west (-x, +y)
    NW = 7,
}

impl Direction {
    /// All octants in clockwise order starting at north.
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Direction from an integer code.
    ///
    /// Total over `i32`: codes outside 0-7 wrap with the Euclidean
    /// remainder, so `-1` is `NW` and `10` is `E`.
    #[inline]
    pub fn from_code(code: i32) -> Self {
        Self::ALL[code.rem_euclid(OCTANT_COUNT as i32) as usize]
    }

    /// Integer code (0-7).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The octant pointing the other way.
    #[inline]
    pub fn opposite(self) -> Self {
        self.rotate_cw(4)
    }

    /// Rotate clockwise by `steps` octants.
    #[inline]
    pub fn rotate_cw(self, steps: u8) -> Self {
        Self::ALL[((self.code() + steps % OCTANT_COUNT) % OCTANT_COUNT) as usize]
    }

    /// Compass abbreviation (`"N"`, `"NE"`, ...).
    pub const fn abbrev(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// Unknown compass abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown compass direction {0:?}")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.abbrev().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseDirectionError(s.to_string()))
    }
}

/// Octant of `to` as seen from `from`.
///
/// Returns `None` when the two points coincide or when `to` is not
/// exactly on one of the eight principal rays from `from`.
pub fn classify(from: Point, to: Point) -> Option<Direction> {
    let (dx, dy) = from.delta_to(to);

    if dx == 0 {
        return match dy {
            d if d > 0 => Some(Direction::N),
            d if d < 0 => Some(Direction::S),
            _ => None,
        };
    }
    if dy == 0 {
        return Some(if dx > 0 { Direction::E } else { Direction::W });
    }
    if dx == dy {
        return Some(if dx > 0 { Direction::NE } else { Direction::SW });
    }
    if dx == -dy {
        return Some(if dx > 0 { Direction::SE } else { Direction::NW });
    }

    None
}
