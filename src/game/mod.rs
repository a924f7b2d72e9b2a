//! Game Logic Module
//!
//! All simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `state`: Simulation input/output and the in-flight player arena
//! - `target`: Nearest-player search along one octant
//! - `simulation`: Elimination loop
//! - `events`: Throw log for tracing and replay checks
//! - `scenario`: Batch text format

pub mod state;
pub mod target;
pub mod simulation;
pub mod events;
pub mod scenario;

// Re-export key types
pub use state::{Player, SimulationInput, SimulationResult, SimulationState};
pub use target::{Target, find_target};
pub use simulation::{
    SimulationError, SimulationOutcome, StartIndexReason,
    run_simulation, run_simulation_traced, select_throw, step,
};
pub use events::ThrowEvent;
pub use scenario::{ScenarioError, parse_batch, run_batch, format_result, format_results};
