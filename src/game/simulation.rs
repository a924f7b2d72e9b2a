//! Elimination Loop
//!
//! The authoritative simulation. Pure and deterministic: the same input
//! always yields the same throws, in the same order, on any platform.
//!
//! Each step the holder scans the seven octants clockwise from its
//! direction value (the direction value itself is never scanned). The
//! first octant holding an alive player decides the throw: the nearest
//! player there takes the ball, the holder is eliminated, and the new
//! holder's direction value becomes the reciprocal of the throw. The
//! run ends when no octant yields a target.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::direction::Direction;
use crate::game::events::ThrowEvent;
use crate::game::state::{SimulationInput, SimulationResult, SimulationState};
use crate::game::target::{Target, find_target};

/// Clockwise offsets scanned from the direction value, in order.
pub const SCAN_OFFSETS: std::ops::RangeInclusive<u8> = 1..=7;

/// Why a start index was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartIndexReason {
    /// Negative or past the end of the roster.
    #[error("out of range for {len} players")]
    OutOfRange {
        /// Roster size.
        len: usize,
    },
    /// Names a player that starts eliminated.
    #[error("player is already eliminated")]
    Eliminated,
}

/// Malformed simulation input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// No players were supplied.
    #[error("roster is empty")]
    EmptyRoster,

    /// The start index does not name an alive player.
    #[error("invalid start index {index}: {reason}")]
    InvalidStartIndex {
        /// Index as supplied.
        index: i32,
        /// What was wrong with it.
        reason: StartIndexReason,
    },
}

/// A finished run with its throw log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Final throw count and holder.
    pub result: SimulationResult,
    /// Every throw, in order.
    pub throws: Vec<ThrowEvent>,
    /// Players still on the court at termination.
    pub survivors: usize,
}

/// Pick the next throw for the current holder, if any.
pub fn select_throw(state: &SimulationState) -> Option<(Target, Direction)> {
    let facing = state.direction();
    SCAN_OFFSETS.find_map(|offset| {
        let octant = facing.rotate_cw(offset);
        find_target(state, octant).map(|target| (target, octant))
    })
}

/// Advance one transition.
///
/// Returns the throw taken, or `None` once the run is terminal.
pub fn step(state: &mut SimulationState) -> Option<ThrowEvent> {
    let (target, octant) = select_throw(state)?;
    let from = state.holder();

    state.record_throw(target.index, octant);

    Some(ThrowEvent::new(
        state.throws(),
        from,
        target.index,
        octant,
        target.distance_squared,
    ))
}

/// Run a scenario to completion.
///
/// # Errors
///
/// [`SimulationError::EmptyRoster`] for zero players and
/// [`SimulationError::InvalidStartIndex`] when the start index is out
/// of range or names an eliminated player. Every other input, including
/// unreachable geometry and out-of-range direction codes, runs normally.
pub fn run_simulation(input: &SimulationInput) -> Result<SimulationResult, SimulationError> {
    let mut state = SimulationState::new(input)?;
    while step(&mut state).is_some() {}
    Ok(state.result())
}

/// Run a scenario to completion, recording every throw.
pub fn run_simulation_traced(input: &SimulationInput) -> Result<SimulationOutcome, SimulationError> {
    let mut state = SimulationState::new(input)?;
    let mut throws = Vec::new();

    while let Some(event) = step(&mut state) {
        throws.push(event);
    }

    Ok(SimulationOutcome {
        result: state.result(),
        throws,
        survivors: state.alive_count(),
    })
}
