//! Batch Scenario Format
//!
//! Plain-text batches of scenarios, one result line per scenario.
//!
//! ```text
//! T              number of scenarios
//! N              players in this scenario
//! x1 y1          N coordinate pairs
//! ...
//! DIR            start direction abbreviation (N, NE, ..., NW)
//! S              1-based start index
//! ```
//!
//! Tokens are whitespace-separated, so line breaks are cosmetic. Each
//! result is written as `throws last_player` with `last_player` 1-based.
//!
//! A batch may also be JSON: a single [`SimulationInput`] object or an
//! array of them (0-based indices, numeric direction codes).

use thiserror::Error;

use crate::core::direction::Direction;
use crate::game::simulation::{SimulationError, run_simulation};
use crate::game::state::{Player, SimulationInput, SimulationResult};

/// Batch parse or run failure.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Input ended while a value was still expected.
    #[error("unexpected end of input at token {position}: expected {expected}")]
    UnexpectedEnd {
        /// 0-based token position.
        position: usize,
        /// What was being read.
        expected: &'static str,
    },

    /// A token could not be read as the expected value.
    #[error("invalid token {token:?} at position {position}: expected {expected}")]
    InvalidToken {
        /// The offending token.
        token: String,
        /// 0-based token position.
        position: usize,
        /// What was being read.
        expected: &'static str,
    },

    /// Extra tokens after the last declared scenario.
    #[error("unexpected trailing token {token:?} at position {position}")]
    TrailingTokens {
        /// First extra token.
        token: String,
        /// 0-based token position.
        position: usize,
    },

    /// JSON batch could not be decoded.
    #[error("invalid JSON batch: {0}")]
    Json(#[from] serde_json::Error),

    /// A parsed scenario was rejected by the simulation.
    #[error("scenario {case}: {source}")]
    Simulation {
        /// 1-based scenario number.
        case: usize,
        /// The simulation error.
        #[source]
        source: SimulationError,
    },
}

/// Whitespace token cursor that remembers its position for errors.
struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
            position: 0,
        }
    }

    fn next_token(&mut self, expected: &'static str) -> Result<(&'a str, usize), ScenarioError> {
        let position = self.position;
        let token = self.inner.next().ok_or(ScenarioError::UnexpectedEnd { position, expected })?;
        self.position += 1;
        Ok((token, position))
    }

    fn parse<T: std::str::FromStr>(&mut self, expected: &'static str) -> Result<T, ScenarioError> {
        let (token, position) = self.next_token(expected)?;
        token.parse().map_err(|_| ScenarioError::InvalidToken {
            token: token.to_string(),
            position,
            expected,
        })
    }

    fn finish(mut self) -> Result<(), ScenarioError> {
        match self.inner.next() {
            Some(token) => Err(ScenarioError::TrailingTokens {
                token: token.to_string(),
                position: self.position,
            }),
            None => Ok(()),
        }
    }
}

/// Parse a batch of scenarios (text or JSON).
pub fn parse_batch(text: &str) -> Result<Vec<SimulationInput>, ScenarioError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    if trimmed.starts_with('{') {
        return Ok(vec![serde_json::from_str(trimmed)?]);
    }

    let mut tokens = Tokens::new(text);
    let count: usize = tokens.parse("scenario count")?;

    let mut scenarios = Vec::new();
    for _ in 0..count {
        scenarios.push(parse_scenario(&mut tokens)?);
    }

    tokens.finish()?;
    Ok(scenarios)
}

fn parse_scenario(tokens: &mut Tokens<'_>) -> Result<SimulationInput, ScenarioError> {
    let player_count: usize = tokens.parse("player count")?;

    let mut players = Vec::new();
    for _ in 0..player_count {
        let x: i64 = tokens.parse("x coordinate")?;
        let y: i64 = tokens.parse("y coordinate")?;
        players.push(Player::new(x, y));
    }

    let direction: Direction = tokens.parse("start direction (N, NE, E, SE, S, SW, W, NW)")?;
    let start: i64 = tokens.parse("1-based start index")?;

    // Out-of-range indices are left for the simulation to reject.
    let start_index = i32::try_from(start.saturating_sub(1)).unwrap_or(i32::MIN);

    Ok(SimulationInput {
        players,
        start_index,
        start_direction: direction.code() as i32,
    })
}

/// Format one result as `throws last_player` (1-based).
pub fn format_result(result: &SimulationResult) -> String {
    format!("{} {}", result.throws, i64::from(result.last_player) + 1)
}

/// Format a batch of results, one per line.
pub fn format_results(results: &[SimulationResult]) -> String {
    results.iter().map(format_result).collect::<Vec<_>>().join("\n")
}

/// Parse and run every scenario in a batch.
pub fn run_batch(text: &str) -> Result<Vec<SimulationResult>, ScenarioError> {
    parse_batch(text)?
        .iter()
        .enumerate()
        .map(|(i, input)| {
            run_simulation(input).map_err(|source| ScenarioError::Simulation { case: i + 1, source })
        })
        .collect()
}
