//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Text frames carry JSON messages tagged by `"type"`. Binary frames
//! carry a bincode `SimulationRequest` and are answered with a bincode
//! `SimulationResponse`; bincode cannot decode tagged enums, so only
//! these flat structs travel as binary.

use serde::{Serialize, Deserialize};

use crate::game::events::ThrowEvent;
use crate::game::simulation::{SimulationError, SimulationOutcome};
use crate::game::state::{Player, SimulationInput, SimulationResult};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Run one scenario.
    RunSimulation(SimulationRequest),

    /// Run a batch in the text (or JSON) batch format.
    RunBatch(BatchRequest),

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

/// A single simulation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Caller-chosen id echoed back in the response.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Ordered roster; index is identity.
    pub players: Vec<Player>,
    /// Index of the initial ball holder.
    pub start_index: i32,
    /// Initial direction code (0-7).
    pub start_direction: i32,
    /// Include the throw log in the response.
    #[serde(default)]
    pub trace: bool,
}

impl SimulationRequest {
    /// Wrap a scenario in a request.
    pub fn new(input: SimulationInput) -> Self {
        Self {
            request_id: None,
            players: input.players,
            start_index: input.start_index,
            start_direction: input.start_direction,
            trace: false,
        }
    }

    /// Set the request id.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Ask for the throw log.
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Convert to the simulation input.
    pub fn to_input(&self) -> SimulationInput {
        SimulationInput {
            players: self.players.clone(),
            start_index: self.start_index,
            start_direction: self.start_direction,
        }
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// A batch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Caller-chosen id echoed back in the response.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Batch text.
    pub text: String,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Result of a `run_simulation` call.
    SimulationResult(SimulationResponse),

    /// Result of a `run_batch` call.
    BatchResult(BatchResponse),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown { reason: String },
}

/// Simulation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResponse {
    /// Echo of the request id.
    pub request_id: Option<String>,
    /// Total throws.
    pub throws: i32,
    /// Index of the last holder.
    pub last_player: i32,
    /// Hex SHA-256 digest of the scenario that was run.
    pub scenario_hash: String,
    /// Throw log, when requested.
    #[serde(default)]
    pub trace: Option<Vec<ThrowEvent>>,
}

impl SimulationResponse {
    /// Build from a finished run.
    pub fn from_outcome(request: &SimulationRequest, outcome: SimulationOutcome) -> Self {
        let input = request.to_input();
        Self {
            request_id: request.request_id.clone(),
            throws: outcome.result.throws,
            last_player: outcome.result.last_player,
            scenario_hash: hex::encode(input.scenario_hash()),
            trace: request.trace.then_some(outcome.throws),
        }
    }

    /// The bare result.
    pub fn result(&self) -> SimulationResult {
        SimulationResult {
            throws: self.throws,
            last_player: self.last_player,
        }
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Echo of the request id.
    pub request_id: Option<String>,
    /// One `throws last_player` line per scenario (1-based players).
    pub output: String,
    /// Number of scenarios run.
    pub cases: u32,
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Echo of the request id, when the request got far enough to have one.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Create a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            request_id: None,
            code,
            message: message.into(),
        }
    }

    /// Attach the request id.
    pub fn for_request(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

impl From<&SimulationError> for ServerError {
    /// Simulation errors pass through with their own code and text.
    fn from(err: &SimulationError) -> Self {
        let code = match err {
            SimulationError::EmptyRoster => ErrorCode::EmptyRoster,
            SimulationError::InvalidStartIndex { .. } => ErrorCode::InvalidStartIndex,
        };
        Self::new(code, err.to_string())
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed message or batch.
    InvalidInput,
    /// Simulation rejected: no players.
    EmptyRoster,
    /// Simulation rejected: start index does not name an alive player.
    InvalidStartIndex,
    /// Roster exceeds the server's configured limit.
    RosterTooLarge,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::direction::Direction;
    use crate::game::simulation::{StartIndexReason, run_simulation_traced};

    fn line_request() -> SimulationRequest {
        SimulationRequest::new(SimulationInput::new(&[(0, 0), (1, 0), (2, 0)], 0, Direction::N))
    }

    #[test]
    fn test_run_simulation_json_shape() {
        let json = r#"{
            "type": "run_simulation",
            "request_id": "abc",
            "players": [{"x": 0, "y": 0, "alive": true}, {"x": 1, "y": 0}],
            "start_index": 0,
            "start_direction": 0
        }"#;

        match ClientMessage::from_json(json).unwrap() {
            ClientMessage::RunSimulation(req) => {
                assert_eq!(req.request_id.as_deref(), Some("abc"));
                assert_eq!(req.players.len(), 2);
                assert!(req.players[1].alive);
                assert!(!req.trace);
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_client_message_json_roundtrip() {
        let msg = ClientMessage::RunBatch(BatchRequest {
            request_id: None,
            text: "1 1 0 0 N 1".to_string(),
        });

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"run_batch""#));

        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::RunBatch(req) => assert_eq!(req.text, "1 1 0 0 N 1"),
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_binary_request_roundtrip() {
        let request = line_request().with_request_id("bin-1").with_trace();
        let bytes = request.to_bytes().unwrap();
        assert_eq!(SimulationRequest::from_bytes(&bytes).unwrap(), request);
    }

    #[test]
    fn test_response_from_outcome() {
        let request = line_request().with_request_id("r1");
        let outcome = run_simulation_traced(&request.to_input()).unwrap();
        let response = SimulationResponse::from_outcome(&request, outcome);

        assert_eq!(response.request_id.as_deref(), Some("r1"));
        assert_eq!(response.result(), SimulationResult { throws: 2, last_player: 2 });
        assert_eq!(response.scenario_hash.len(), 64);
        assert_eq!(response.trace, None);

        let traced = request.with_trace();
        let outcome = run_simulation_traced(&traced.to_input()).unwrap();
        let response = SimulationResponse::from_outcome(&traced, outcome);
        assert_eq!(response.trace.map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_binary_response_roundtrip() {
        let request = line_request().with_trace();
        let outcome = run_simulation_traced(&request.to_input()).unwrap();
        let response = SimulationResponse::from_outcome(&request, outcome);

        let bytes = response.to_bytes().unwrap();
        assert_eq!(SimulationResponse::from_bytes(&bytes).unwrap(), response);
    }

    #[test]
    fn test_simulation_error_passes_through() {
        let err = SimulationError::InvalidStartIndex {
            index: 9,
            reason: StartIndexReason::OutOfRange { len: 3 },
        };
        let server_err = ServerError::from(&err);
        assert_eq!(server_err.code, ErrorCode::InvalidStartIndex);
        assert_eq!(server_err.message, err.to_string());

        let json = ServerMessage::Error(server_err.for_request(Some("x".into()))).to_json().unwrap();
        assert!(json.contains("invalid_start_index"));
        assert!(json.contains(r#""request_id":"x""#));

        let empty = ServerError::from(&SimulationError::EmptyRoster);
        assert_eq!(empty.code, ErrorCode::EmptyRoster);
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let msg = ServerMessage::BatchResult(BatchResponse {
            request_id: Some("b".into()),
            output: "2 3\n0 1".into(),
            cases: 2,
        });

        let json = msg.to_json().unwrap();
        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::BatchResult(res) => {
                assert_eq!(res.cases, 2);
                assert_eq!(res.output, "2 3\n0 1");
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }
}
