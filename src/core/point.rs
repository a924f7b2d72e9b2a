//! Integer 2D Point
//!
//! Player positions on the court. Everything is exact integer math:
//! offsets widen to `i128` and squared distances to `u128`, so no
//! coordinate pair an `i64` can hold will overflow a comparison.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A position on the court.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (east is positive).
    pub x: i64,
    /// Y coordinate (north is positive).
    pub y: i64,
}

impl Point {
    /// Origin.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Signed offset `(dx, dy)` from `self` to `other`.
    #[inline]
    pub fn delta_to(self, other: Self) -> (i128, i128) {
        (
            other.x as i128 - self.x as i128,
            other.y as i128 - self.y as i128,
        )
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Each squared axis term fits in a `u128`; only the final sum of two
    /// near-`i64`-span diagonals can saturate.
    #[inline]
    pub fn distance_squared(self, other: Self) -> u128 {
        let (dx, dy) = self.delta_to(other);
        let dx = dx.unsigned_abs();
        let dy = dy.unsigned_abs();
        (dx * dx).saturating_add(dy * dy)
    }
}

impl From<(i64, i64)> for Point {
    #[inline]
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_to() {
        let a = Point::new(3, -2);
        let b = Point::new(-1, 5);
        assert_eq!(a.delta_to(b), (-4, 7));
        assert_eq!(b.delta_to(a), (4, -7));
        assert_eq!(a.delta_to(a), (0, 0));
    }

    #[test]
    fn test_distance_squared() {
        // 3-4-5 triangle
        let a = Point::ORIGIN;
        let b = Point::new(3, 4);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
    }

    #[test]
    fn test_distance_squared_large_coordinates() {
        let a = Point::new(-1_000_000, -1_000_000);
        let b = Point::new(1_000_000, 1_000_000);
        assert_eq!(a.distance_squared(b), 8_000_000_000_000);
    }

    #[test]
    fn test_distance_squared_extreme_span() {
        let a = Point::new(i64::MIN, 0);
        let b = Point::new(i64::MAX, 0);
        let span = u64::MAX as u128;
        assert_eq!(a.distance_squared(b), span * span);
    }

    #[test]
    fn test_display() {
        assert_eq!(Point::new(-7, 12).to_string(), "(-7, 12)");
    }
}
