//! Network Layer
//!
//! WebSocket server and client for remote simulation calls.
//! This layer is **non-deterministic** - all simulation logic runs through `game/`.

pub mod protocol;
pub mod server;
pub mod client;

pub use protocol::{
    ClientMessage, ServerMessage, SimulationRequest, SimulationResponse,
    BatchRequest, BatchResponse, ServerError, ErrorCode,
};
pub use server::{SimulationServer, ServerConfig, SimulationServerError};
pub use client::{SimulationClient, ClientError};
