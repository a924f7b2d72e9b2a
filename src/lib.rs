//! # Dodgeball Elimination Server
//!
//! Deterministic dodgeball elimination simulation, served over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DODGEBALL SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── point.rs    - Integer grid points, exact distances      │
//! │  ├── direction.rs- Compass octants and the classifier        │
//! │  └── hash.rs     - Scenario digests                          │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── state.rs    - Input, result and player arena            │
//! │  ├── target.rs   - Nearest player in an octant               │
//! │  ├── simulation.rs- Elimination loop                         │
//! │  ├── events.rs   - Throw log                                 │
//! │  └── scenario.rs - Batch text format                         │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - WebSocket server                          │
//! │  ├── client.rs   - WebSocket client                          │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic
//! - Exact 128-bit distance arithmetic for any `i64` coordinates
//! - Candidates scanned in index order, ties broken by lowest index
//! - No shared state between calls
//!
//! Given identical inputs, a simulation produces **identical results**
//! on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::direction::Direction;
pub use core::point::Point;
pub use game::simulation::{run_simulation, run_simulation_traced, SimulationError};
pub use game::state::{Player, SimulationInput, SimulationResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
