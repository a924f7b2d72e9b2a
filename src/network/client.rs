//! WebSocket client for the simulation server.
//!
//! One request in flight at a time; the server answers each connection
//! in order, so every call just reads the next reply.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument};

use crate::game::state::SimulationResult;
use crate::network::protocol::{
    BatchRequest, BatchResponse, ClientMessage, ErrorCode, ServerError, ServerMessage,
    SimulationRequest, SimulationResponse,
};

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON encode/decode failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// bincode encode/decode failure.
    #[error("binary frame error: {0}")]
    Binary(#[from] bincode::Error),

    /// The server rejected the request.
    #[error("server error ({code:?}): {message}")]
    Server {
        /// Error code.
        code: ErrorCode,
        /// Server's message.
        message: String,
    },

    /// The server is going away.
    #[error("server shutting down: {0}")]
    Shutdown(String),

    /// A reply of the wrong kind.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// Connection closed before a reply arrived.
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<ServerError> for ClientError {
    fn from(err: ServerError) -> Self {
        Self::Server {
            code: err.code,
            message: err.message,
        }
    }
}

/// Reply frame, decoded as far as the frame type allows.
enum Reply {
    Message(ServerMessage),
    Binary(Vec<u8>),
}

/// Connected simulation client.
pub struct SimulationClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SimulationClient {
    /// Connect to `ws://host:port`.
    #[instrument]
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _) = connect_async(url).await?;
        debug!("Connected");
        Ok(Self { ws })
    }

    /// Run one scenario over a JSON text frame.
    pub async fn run_simulation(&mut self, request: SimulationRequest) -> Result<SimulationResponse, ClientError> {
        self.send(&ClientMessage::RunSimulation(request)).await?;
        match self.next_message().await? {
            ServerMessage::SimulationResult(response) => Ok(response),
            other => Err(Self::unexpected(other)),
        }
    }

    /// Run one scenario over a bincode binary frame.
    pub async fn run_simulation_binary(
        &mut self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, ClientError> {
        self.ws.send(Message::Binary(request.to_bytes()?)).await?;
        match self.next_reply().await? {
            Reply::Binary(data) => Ok(SimulationResponse::from_bytes(&data)?),
            Reply::Message(other) => Err(Self::unexpected(other)),
        }
    }

    /// Run one scenario and keep only the bare result.
    pub async fn simulate(&mut self, request: SimulationRequest) -> Result<SimulationResult, ClientError> {
        Ok(self.run_simulation(request).await?.result())
    }

    /// Run a batch.
    pub async fn run_batch(&mut self, text: impl Into<String>) -> Result<BatchResponse, ClientError> {
        let request = BatchRequest {
            request_id: None,
            text: text.into(),
        };
        self.send(&ClientMessage::RunBatch(request)).await?;
        match self.next_message().await? {
            ServerMessage::BatchResult(response) => Ok(response),
            other => Err(Self::unexpected(other)),
        }
    }

    /// Round-trip a ping, returning the server's clock in ms.
    pub async fn ping(&mut self) -> Result<u64, ClientError> {
        let timestamp = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        self.send(&ClientMessage::Ping { timestamp }).await?;
        match self.next_message().await? {
            ServerMessage::Pong { timestamp: echoed, server_time } if echoed == timestamp => Ok(server_time),
            other => Err(Self::unexpected(other)),
        }
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.ws.close(None).await?;
        Ok(())
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        self.ws.send(Message::Text(msg.to_json()?)).await?;
        Ok(())
    }

    async fn next_message(&mut self) -> Result<ServerMessage, ClientError> {
        match self.next_reply().await? {
            Reply::Message(msg) => Ok(msg),
            Reply::Binary(_) => Err(ClientError::UnexpectedReply("binary frame".to_string())),
        }
    }

    /// Read the next data frame. Server errors and shutdown notices
    /// become `Err`.
    async fn next_reply(&mut self) -> Result<Reply, ClientError> {
        loop {
            let frame = match self.ws.next().await {
                Some(frame) => frame?,
                None => return Err(ClientError::ConnectionClosed),
            };

            match frame {
                Message::Text(text) => {
                    return match ServerMessage::from_json(&text)? {
                        ServerMessage::Error(err) => Err(err.into()),
                        ServerMessage::Shutdown { reason } => Err(ClientError::Shutdown(reason)),
                        msg => Ok(Reply::Message(msg)),
                    };
                }
                Message::Binary(data) => return Ok(Reply::Binary(data)),
                Message::Close(_) => return Err(ClientError::ConnectionClosed),
                _ => continue,
            }
        }
    }

    fn unexpected(msg: ServerMessage) -> ClientError {
        ClientError::UnexpectedReply(format!("{msg:?}"))
    }
}
