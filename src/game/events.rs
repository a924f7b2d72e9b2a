//! Throw Events
//!
//! Ordered log of the transitions taken during a run, for tracing and
//! replay verification.

use serde::{Serialize, Deserialize};
use crate::core::direction::Direction;

/// One elimination transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowEvent {
    /// 1-based position of this throw in the run.
    pub throw_number: u32,
    /// Thrower (eliminated by this throw).
    pub from: usize,
    /// Receiver (new holder).
    pub to: usize,
    /// Octant the ball travelled in, as seen from the thrower.
    pub direction: Direction,
    /// Squared distance between thrower and receiver.
    #[serde(with = "decimal")]
    pub distance_squared: u128,
}

/// `u128` as a decimal string. Tagged-enum buffering in serde cannot
/// hold integers wider than 64 bits.
mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(de::Error::custom)
    }
}

impl ThrowEvent {
    /// Create a new event.
    pub fn new(
        throw_number: u32,
        from: usize,
        to: usize,
        direction: Direction,
        distance_squared: u128,
    ) -> Self {
        Self {
            throw_number,
            from,
            to,
            direction,
            distance_squared,
        }
    }

    /// Direction value the receiver carries into its own scan.
    #[inline]
    pub fn incoming(&self) -> Direction {
        self.direction.opposite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_is_reciprocal() {
        let event = ThrowEvent::new(1, 0, 2, Direction::NE, 2);
        assert_eq!(event.incoming(), Direction::SW);
    }

    #[test]
    fn test_event_json_shape() {
        let event = ThrowEvent::new(3, 4, 5, Direction::SE, 8);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""direction":"SE""#));
        assert!(json.contains(r#""distance_squared":"8""#));
    }

    #[test]
    fn test_wide_distance_survives_json() {
        let event = ThrowEvent::new(1, 0, 1, Direction::NE, u128::from(u64::MAX) * 4);
        let json = serde_json::to_string(&event).unwrap();
        let back: ThrowEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
