//! Simulation State Definitions
//!
//! Input, output and in-flight state for one simulation run.
//!
//! Players live in an index-addressed arena: a player's identity is its
//! position in the input sequence and never changes. Eliminated players
//! are flagged, not removed, so throw order and tie-breaks always refer
//! to the original indices.

use serde::{Serialize, Deserialize};

use crate::core::direction::Direction;
use crate::core::hash::{ScenarioHash, compute_scenario_hash};
use crate::core::point::Point;
use crate::game::simulation::{SimulationError, StartIndexReason};

// =============================================================================
// INPUT / OUTPUT
// =============================================================================

fn default_alive() -> bool {
    true
}

/// A player as supplied by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// X coordinate
    pub x: i64,
    /// Y coordinate
    pub y: i64,
    /// Whether the player starts on the court. Defaults to `true` when
    /// omitted from JSON.
    #[serde(default = "default_alive")]
    pub alive: bool,
}

impl Player {
    /// Create an alive player.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y, alive: true }
    }

    /// Create a player that starts eliminated.
    pub const fn eliminated(x: i64, y: i64) -> Self {
        Self { x, y, alive: false }
    }

    /// Position on the court.
    #[inline]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A complete simulation scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Ordered roster; index is identity.
    pub players: Vec<Player>,
    /// Index of the initial ball holder.
    pub start_index: i32,
    /// Initial direction code (0-7, clockwise from north). Wraps mod 8.
    pub start_direction: i32,
}

impl SimulationInput {
    /// Create a scenario where every player starts alive.
    pub fn new(positions: &[(i64, i64)], start_index: i32, start_direction: Direction) -> Self {
        Self {
            players: positions.iter().map(|&(x, y)| Player::new(x, y)).collect(),
            start_index,
            start_direction: start_direction.code() as i32,
        }
    }

    /// Number of players that start alive.
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// Deterministic digest of the scenario.
    pub fn scenario_hash(&self) -> ScenarioHash {
        compute_scenario_hash(self.players.len(), |hasher| {
            for player in &self.players {
                hasher.update_point(player.position());
                hasher.update_bool(player.alive);
            }
            hasher.update_i32(self.start_index);
            hasher.update_i32(self.start_direction);
        })
    }
}

/// Outcome of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Total elimination transitions taken.
    pub throws: i32,
    /// Index of the ball holder at termination.
    pub last_player: i32,
}

// =============================================================================
// IN-FLIGHT STATE
// =============================================================================

/// Mutable state of one simulation run.
///
/// Built from a validated [`SimulationInput`], mutated only through
/// [`SimulationState::record_throw`], discarded once the result is read.
#[derive(Clone, Debug)]
pub struct SimulationState {
    positions: Vec<Point>,
    alive: Vec<bool>,
    holder: usize,
    /// Octant excluded from the holder's scan: the start direction
    /// first, then the reciprocal of the last throw.
    direction: Direction,
    throws: u32,
    alive_count: usize,
}

impl SimulationState {
    /// Build the initial state, rejecting an empty roster or a start
    /// index that does not name an alive player.
    pub fn new(input: &SimulationInput) -> Result<Self, SimulationError> {
        let len = input.players.len();
        if len == 0 {
            return Err(SimulationError::EmptyRoster);
        }

        let holder = usize::try_from(input.start_index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(SimulationError::InvalidStartIndex {
                index: input.start_index,
                reason: StartIndexReason::OutOfRange { len },
            })?;

        if !input.players[holder].alive {
            return Err(SimulationError::InvalidStartIndex {
                index: input.start_index,
                reason: StartIndexReason::Eliminated,
            });
        }

        let positions: Vec<Point> = input.players.iter().map(Player::position).collect();
        let alive: Vec<bool> = input.players.iter().map(|p| p.alive).collect();
        let alive_count = alive.iter().filter(|&&a| a).count();

        Ok(Self {
            positions,
            alive,
            holder,
            direction: Direction::from_code(input.start_direction),
            throws: 0,
            alive_count,
        })
    }

    /// Roster size (alive and eliminated).
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false: construction rejects empty rosters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Current ball holder.
    #[inline]
    pub fn holder(&self) -> usize {
        self.holder
    }

    /// Current direction value.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Throws taken so far.
    #[inline]
    pub fn throws(&self) -> u32 {
        self.throws
    }

    /// Players still on the court, holder included.
    #[inline]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Position of a player.
    #[inline]
    pub fn position(&self, index: usize) -> Point {
        self.positions[index]
    }

    /// Whether a player is still on the court.
    #[inline]
    pub fn is_alive(&self, index: usize) -> bool {
        self.alive[index]
    }

    /// Alive players other than the holder, in ascending index order.
    pub fn candidates(&self) -> impl Iterator<Item = (usize, Point)> + '_ {
        let holder = self.holder;
        self.positions
            .iter()
            .zip(&self.alive)
            .enumerate()
            .filter(move |&(i, (_, &alive))| alive && i != holder)
            .map(|(i, (&pos, _))| (i, pos))
    }

    /// Apply one throw: the holder is eliminated, `target` takes the
    /// ball and faces back along `thrown`.
    pub(crate) fn record_throw(&mut self, target: usize, thrown: Direction) {
        debug_assert!(target != self.holder, "holder cannot throw to itself");
        debug_assert!(self.alive[target], "target must be alive");

        self.alive[self.holder] = false;
        self.alive_count -= 1;
        self.holder = target;
        self.direction = thrown.opposite();
        self.throws += 1;
    }

    /// Read out the result at the current point of the run.
    pub fn result(&self) -> SimulationResult {
        SimulationResult {
            throws: i32::try_from(self.throws).unwrap_or(i32::MAX),
            last_player: i32::try_from(self.holder).unwrap_or(i32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_input() -> SimulationInput {
        SimulationInput::new(&[(0, 0), (1, 0), (2, 0)], 0, Direction::N)
    }

    #[test]
    fn test_new_state() {
        let state = SimulationState::new(&line_input()).unwrap();
        assert_eq!(state.len(), 3);
        assert_eq!(state.holder(), 0);
        assert_eq!(state.direction(), Direction::N);
        assert_eq!(state.throws(), 0);
        assert_eq!(state.alive_count(), 3);
        assert_eq!(state.position(2), Point::new(2, 0));
    }

    #[test]
    fn test_empty_roster_rejected() {
        let input = SimulationInput::new(&[], 0, Direction::N);
        assert_eq!(SimulationState::new(&input).unwrap_err(), SimulationError::EmptyRoster);
    }

    #[test]
    fn test_out_of_range_start_rejected() {
        for index in [-1, 3, i32::MAX] {
            let mut input = line_input();
            input.start_index = index;
            assert_eq!(
                SimulationState::new(&input).unwrap_err(),
                SimulationError::InvalidStartIndex {
                    index,
                    reason: StartIndexReason::OutOfRange { len: 3 },
                }
            );
        }
    }

    #[test]
    fn test_eliminated_start_rejected() {
        let mut input = line_input();
        input.players[0].alive = false;
        assert_eq!(
            SimulationState::new(&input).unwrap_err(),
            SimulationError::InvalidStartIndex {
                index: 0,
                reason: StartIndexReason::Eliminated,
            }
        );
    }

    #[test]
    fn test_start_direction_wraps() {
        let mut input = line_input();
        input.start_direction = -1;
        let state = SimulationState::new(&input).unwrap();
        assert_eq!(state.direction(), Direction::NW);
    }

    #[test]
    fn test_candidates_skip_holder_and_eliminated() {
        let mut input = SimulationInput::new(&[(0, 0), (1, 0), (2, 0), (3, 0)], 1, Direction::N);
        input.players[2].alive = false;
        let state = SimulationState::new(&input).unwrap();
        let indices: Vec<usize> = state.candidates().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 3]);
        assert_eq!(state.alive_count(), 3);
    }

    #[test]
    fn test_record_throw() {
        let mut state = SimulationState::new(&line_input()).unwrap();
        state.record_throw(1, Direction::E);

        assert!(!state.is_alive(0));
        assert!(state.is_alive(1));
        assert_eq!(state.holder(), 1);
        assert_eq!(state.direction(), Direction::W);
        assert_eq!(state.throws(), 1);
        assert_eq!(state.alive_count(), 2);
        assert_eq!(state.result(), SimulationResult { throws: 1, last_player: 1 });
    }

    #[test]
    fn test_player_alive_defaults_true_in_json() {
        let player: Player = serde_json::from_str(r#"{"x": 4, "y": -2}"#).unwrap();
        assert_eq!(player, Player::new(4, -2));

        let player: Player = serde_json::from_str(r#"{"x": 4, "y": -2, "alive": false}"#).unwrap();
        assert_eq!(player, Player::eliminated(4, -2));
    }

    #[test]
    fn test_scenario_hash() {
        let a = line_input();
        let b = line_input();
        assert_eq!(a.scenario_hash(), b.scenario_hash());

        let mut moved = line_input();
        moved.players[2].y = 1;
        assert_ne!(a.scenario_hash(), moved.scenario_hash());

        let mut turned = line_input();
        turned.start_direction = 4;
        assert_ne!(a.scenario_hash(), turned.scenario_hash());

        let mut benched = line_input();
        benched.players[1].alive = false;
        assert_ne!(a.scenario_hash(), benched.scenario_hash());
    }
}
