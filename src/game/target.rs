//! Target Search
//!
//! Finds who the holder can throw to in a given octant.

use crate::core::direction::{Direction, classify};
use crate::game::state::SimulationState;

/// A throw target found by [`find_target`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    /// Index of the receiving player.
    pub index: usize,
    /// Squared distance from the holder.
    pub distance_squared: u128,
}

/// Nearest alive player lying exactly in `octant` from the holder.
///
/// Candidates are scanned in ascending index order and the best is
/// replaced only on a strictly smaller distance, so equal-distance ties
/// go to the lowest index.
pub fn find_target(state: &SimulationState, octant: Direction) -> Option<Target> {
    let origin = state.position(state.holder());
    let mut best: Option<Target> = None;

    for (index, position) in state.candidates() {
        if classify(origin, position) != Some(octant) {
            continue;
        }

        let distance_squared = origin.distance_squared(position);
        if best.map_or(true, |b| distance_squared < b.distance_squared) {
            best = Some(Target { index, distance_squared });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::SimulationInput;

    fn state(positions: &[(i64, i64)], start: i32) -> SimulationState {
        SimulationState::new(&SimulationInput::new(positions, start, Direction::N)).unwrap()
    }

    #[test]
    fn test_nearest_in_octant_wins() {
        let s = state(&[(0, 0), (5, 0), (2, 0), (9, 0)], 0);
        let target = find_target(&s, Direction::E).unwrap();
        assert_eq!(target, Target { index: 2, distance_squared: 4 });
    }

    #[test]
    fn test_other_octants_ignored() {
        let s = state(&[(0, 0), (0, 1), (-1, -1)], 0);
        assert_eq!(find_target(&s, Direction::E), None);
        assert_eq!(find_target(&s, Direction::N).map(|t| t.index), Some(1));
        assert_eq!(find_target(&s, Direction::SW).map(|t| t.index), Some(2));
    }

    #[test]
    fn test_off_ray_never_selected() {
        let s = state(&[(0, 0), (1, 2), (2, 1), (-3, 7)], 0);
        for d in Direction::ALL {
            assert_eq!(find_target(&s, d), None, "nothing is on the {d} ray");
        }
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let s = state(&[(0, 0), (3, 3), (3, 3), (3, 3)], 0);
        for _ in 0..10 {
            assert_eq!(find_target(&s, Direction::NE).map(|t| t.index), Some(1));
        }
    }

    #[test]
    fn test_eliminated_players_skipped() {
        let mut input = SimulationInput::new(&[(0, 0), (0, 1), (0, 2)], 0, Direction::N);
        input.players[1].alive = false;
        let s = SimulationState::new(&input).unwrap();
        assert_eq!(find_target(&s, Direction::N).map(|t| t.index), Some(2));
    }

    #[test]
    fn test_coincident_player_unreachable() {
        let s = state(&[(4, 4), (4, 4)], 0);
        for d in Direction::ALL {
            assert_eq!(find_target(&s, d), None);
        }
    }
}
