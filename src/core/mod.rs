//! Core deterministic primitives.
//!
//! Exact integer geometry for the court. Nothing here allocates,
//! performs I/O or reads the clock.

pub mod point;
pub mod direction;
pub mod hash;

// Re-export core types
pub use point::Point;
pub use direction::{Direction, ParseDirectionError, classify, OCTANT_COUNT};
pub use hash::{ScenarioHash, ScenarioHasher, compute_scenario_hash};
