//! Scenario Hashing
//!
//! Deterministic SHA-256 digests of simulation scenarios for:
//! - Echoing back to clients so they can confirm what the server ran
//! - Correlating request and response log lines

use sha2::{Sha256, Digest};
use super::point::Point;

/// Hash output type (256 bits / 32 bytes)
pub type ScenarioHash = [u8; 32];

/// Domain separator for scenario digests.
pub const SCENARIO_DOMAIN: &[u8] = b"DODGEBALL_SCENARIO_V1";

/// Deterministic hasher for scenarios.
///
/// Wraps SHA-256 with helpers for the scenario field types.
/// Order of updates is critical for determinism.
pub struct ScenarioHasher {
    hasher: Sha256,
}

impl ScenarioHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for a simulation scenario.
    pub fn for_scenario() -> Self {
        Self::new(SCENARIO_DOMAIN)
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i64 value (little-endian).
    #[inline]
    pub fn update_i64(&mut self, value: i64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a Point.
    #[inline]
    pub fn update_point(&mut self, value: Point) {
        self.update_i64(value.x);
        self.update_i64(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> ScenarioHash {
        self.hasher.finalize().into()
    }
}

/// Compute a scenario hash.
///
/// Called by `SimulationInput::scenario_hash()`. The player count is
/// hashed first so that rosters of different lengths never collide on
/// a shared prefix; the closure adds the players themselves.
pub fn compute_scenario_hash<F>(player_count: usize, add_players: F) -> ScenarioHash
where
    F: FnOnce(&mut ScenarioHasher),
{
    let mut hasher = ScenarioHasher::for_scenario();
    hasher.update_u64(player_count as u64);
    add_players(&mut hasher);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_hasher_determinism() {
        let make_hash = || {
            let mut hasher = ScenarioHasher::for_scenario();
            hasher.update_point(Point::new(1, -2));
            hasher.update_bool(true);
            hasher.update_i32(3);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = ScenarioHasher::new(b"test");
            h.update_i64(1);
            h.update_i64(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = ScenarioHasher::new(b"test");
            h.update_i64(2);
            h.update_i64(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let hash1 = ScenarioHasher::new(b"DOMAIN_A").finalize();
        let hash2 = ScenarioHasher::new(b"DOMAIN_B").finalize();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_compute_scenario_hash_counts_players() {
        let hash1 = compute_scenario_hash(1, |h| h.update_point(Point::ORIGIN));
        let hash2 = compute_scenario_hash(2, |h| h.update_point(Point::ORIGIN));
        assert_ne!(hash1, hash2);
    }
}
