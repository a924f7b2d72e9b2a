//! WebSocket Simulation Server
//!
//! Async WebSocket server exposing `RunSimulation` and batch runs.
//! Each connection gets its own task; requests on one connection are
//! answered in order. Simulations run on the blocking pool with their
//! own copy of the roster, so concurrent calls never interact.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument, Instrument};
use uuid::Uuid;

use crate::game::scenario::{ScenarioError, format_results, parse_batch};
use crate::game::simulation::{run_simulation, run_simulation_traced};
use crate::network::protocol::{
    ClientMessage, ServerMessage, SimulationRequest, SimulationResponse,
    BatchRequest, BatchResponse, ServerError, ErrorCode,
};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 50051;

/// Target used for request/response logging.
pub const IO_LOG_TARGET: &str = "dodgeball::io";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Maximum players in one simulation (summed over a batch).
    pub max_players: usize,
    /// Close connections idle for this long.
    pub idle_timeout: Duration,
    /// Log every request and response with its latency.
    pub log_io: bool,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 1000,
            max_players: 100_000,
            idle_timeout: Duration::from_secs(300),
            log_io: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// - `PORT`: listen port
    /// - `DODGEBALL_BIND_HOST`: listen address
    /// - `DODGEBALL_LOG_IO`: any non-empty value enables I/O logging
    /// - `DODGEBALL_MAX_CONNECTIONS`, `DODGEBALL_MAX_PLAYERS`,
    ///   `DODGEBALL_IDLE_TIMEOUT_SECS`
    ///
    /// Unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host: IpAddr = parse_var(&lookup, "DODGEBALL_BIND_HOST").unwrap_or(defaults.bind_addr.ip());
        let port: u16 = parse_var(&lookup, "PORT").unwrap_or(defaults.bind_addr.port());

        Self {
            bind_addr: SocketAddr::new(host, port),
            max_connections: parse_var(&lookup, "DODGEBALL_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            max_players: parse_var(&lookup, "DODGEBALL_MAX_PLAYERS").unwrap_or(defaults.max_players),
            idle_timeout: parse_var(&lookup, "DODGEBALL_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            log_io: lookup("DODGEBALL_LOG_IO").is_some_and(|v| !v.is_empty()),
            version: defaults.version,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

/// Simulation server errors.
#[derive(Debug, thiserror::Error)]
pub enum SimulationServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Connected client state.
struct ConnectedClient {
    /// Connection identifier for logs.
    id: Uuid,
    /// Connection time.
    connected_at: Instant,
    /// Requests served.
    requests: u64,
}

/// Frame queued for the connection's writer task.
enum Outbound {
    /// JSON text frame.
    Message(ServerMessage),
    /// bincode binary frame.
    Binary(SimulationResponse),
}

type Clients = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

/// The simulation server.
pub struct SimulationServer {
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Connected clients.
    clients: Clients,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl SimulationServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config: Arc::new(config),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), SimulationServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener until shutdown.
    #[instrument(skip_all)]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), SimulationServerError> {
        let local_addr = listener.local_addr()?;
        info!("Dodgeball server listening on {}", local_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let id = Uuid::new_v4();
        let span = tracing::info_span!("connection", %id, %addr);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed: {}", e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<Outbound>(64);

            // Register client
            clients.write().await.insert(addr, ConnectedClient {
                id,
                connected_at: Instant::now(),
                requests: 0,
            });

            // Writer task
            let sender_task = tokio::spawn(async move {
                while let Some(out) = msg_rx.recv().await {
                    let frame = match encode_outbound(&out) {
                        Ok(frame) => frame,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(frame).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            }.in_current_span());

            loop {
                tokio::select! {
                    msg = tokio::time::timeout(config.idle_timeout, ws_receiver.next()) => {
                        let msg = match msg {
                            Ok(msg) => msg,
                            Err(_) => {
                                info!("Closing idle connection");
                                break;
                            }
                        };

                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                Self::touch(&clients, addr).await;
                                let reply = match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => Self::handle_client_message(client_msg, &config).await,
                                    Err(e) => {
                                        debug!("Invalid message: {}", e);
                                        ServerMessage::Error(ServerError::new(
                                            ErrorCode::InvalidInput,
                                            format!("Invalid message format: {e}"),
                                        ))
                                    }
                                };
                                if msg_tx.send(Outbound::Message(reply)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Binary(data))) => {
                                Self::touch(&clients, addr).await;
                                let reply = match SimulationRequest::from_bytes(&data) {
                                    Ok(request) => match Self::run_request(&config, request).await {
                                        Ok(response) => Outbound::Binary(response),
                                        Err(err) => Outbound::Message(ServerMessage::Error(err)),
                                    },
                                    Err(e) => {
                                        debug!("Invalid binary request: {}", e);
                                        Outbound::Message(ServerMessage::Error(ServerError::new(
                                            ErrorCode::InvalidInput,
                                            format!("Invalid binary request: {e}"),
                                        )))
                                    }
                                };
                                if msg_tx.send(reply).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client disconnected");
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error: {}", e);
                                break;
                            }
                            // Ping/Pong frames are answered by tungstenite itself
                            Some(Ok(_)) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(Outbound::Message(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        })).await;
                        break;
                    }
                }
            }

            // Let the writer flush queued frames and close the socket
            drop(msg_tx);
            let _ = sender_task.await;

            if let Some(client) = clients.write().await.remove(&addr) {
                info!(
                    requests = client.requests,
                    connected_ms = client.connected_at.elapsed().as_millis() as u64,
                    "Client {} cleaned up",
                    client.id,
                );
            }
        }.instrument(span));
    }

    /// Count a request against the client's record.
    async fn touch(clients: &Clients, addr: SocketAddr) {
        if let Some(client) = clients.write().await.get_mut(&addr) {
            client.requests += 1;
        }
    }

    /// Handle a client message and build the reply.
    async fn handle_client_message(msg: ClientMessage, config: &ServerConfig) -> ServerMessage {
        match msg {
            ClientMessage::RunSimulation(request) => {
                match Self::run_request(config, request).await {
                    Ok(response) => ServerMessage::SimulationResult(response),
                    Err(err) => ServerMessage::Error(err),
                }
            }
            ClientMessage::RunBatch(request) => {
                match Self::run_batch_request(config, request).await {
                    Ok(response) => ServerMessage::BatchResult(response),
                    Err(err) => ServerMessage::Error(err),
                }
            }
            ClientMessage::Ping { timestamp } => ServerMessage::Pong {
                timestamp,
                server_time: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default(),
            },
        }
    }

    /// Run one simulation request.
    ///
    /// Simulation errors are returned with their own code and message.
    pub async fn run_request(
        config: &ServerConfig,
        request: SimulationRequest,
    ) -> Result<SimulationResponse, ServerError> {
        let started = Instant::now();
        let request_id = request.request_id.clone();

        if config.log_io {
            log_io_json("RunSimulation request", &request, None);
        }

        let result = Self::simulate(config, &request).await;

        let elapsed = started.elapsed();
        match &result {
            Ok(response) => debug!(
                request_id = request_id.as_deref().unwrap_or("-"),
                players = request.players.len(),
                throws = response.throws,
                last_player = response.last_player,
                elapsed_us = elapsed.as_micros() as u64,
                "Simulation complete",
            ),
            Err(err) => debug!(
                request_id = request_id.as_deref().unwrap_or("-"),
                code = ?err.code,
                "Simulation rejected: {}",
                err.message,
            ),
        }

        if config.log_io {
            match &result {
                Ok(response) => log_io_json("RunSimulation response", response, Some(elapsed)),
                Err(err) => log_io_json("RunSimulation error", err, Some(elapsed)),
            }
        }

        result
    }

    async fn simulate(
        config: &ServerConfig,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, ServerError> {
        let request_id = request.request_id.clone();

        if request.players.len() > config.max_players {
            return Err(ServerError::new(
                ErrorCode::RosterTooLarge,
                format!(
                    "roster of {} players exceeds the limit of {}",
                    request.players.len(),
                    config.max_players
                ),
            )
            .for_request(request_id));
        }

        let input = request.to_input();
        let outcome = tokio::task::spawn_blocking(move || run_simulation_traced(&input))
            .await
            .map_err(|e| {
                error!("Simulation task failed: {}", e);
                ServerError::new(ErrorCode::InternalError, "simulation task failed")
                    .for_request(request_id.clone())
            })?
            .map_err(|e| ServerError::from(&e).for_request(request_id.clone()))?;

        Ok(SimulationResponse::from_outcome(request, outcome))
    }

    /// Run a batch request.
    pub async fn run_batch_request(
        config: &ServerConfig,
        request: BatchRequest,
    ) -> Result<BatchResponse, ServerError> {
        let started = Instant::now();
        let request_id = request.request_id.clone();

        if config.log_io {
            log_io_json("RunBatch request", &request, None);
        }

        let result = Self::simulate_batch(config, request).await;

        if config.log_io {
            match &result {
                Ok(response) => log_io_json("RunBatch response", response, Some(started.elapsed())),
                Err(err) => log_io_json("RunBatch error", err, Some(started.elapsed())),
            }
        }

        result.map_err(|err| err.for_request(request_id))
    }

    async fn simulate_batch(
        config: &ServerConfig,
        request: BatchRequest,
    ) -> Result<BatchResponse, ServerError> {
        let scenarios = parse_batch(&request.text)
            .map_err(|e| ServerError::new(ErrorCode::InvalidInput, e.to_string()))?;

        let total_players: usize = scenarios.iter().map(|s| s.players.len()).sum();
        if total_players > config.max_players {
            return Err(ServerError::new(
                ErrorCode::RosterTooLarge,
                format!(
                    "batch of {} players exceeds the limit of {}",
                    total_players, config.max_players
                ),
            ));
        }

        let cases = u32::try_from(scenarios.len()).unwrap_or(u32::MAX);
        let results = tokio::task::spawn_blocking(move || {
            scenarios
                .iter()
                .enumerate()
                .map(|(i, input)| {
                    run_simulation(input).map_err(|source| ScenarioError::Simulation { case: i + 1, source })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| {
            error!("Batch task failed: {}", e);
            ServerError::new(ErrorCode::InternalError, "batch task failed")
        })?
        .map_err(|e| {
            let code = match &e {
                ScenarioError::Simulation { source, .. } => ServerError::from(source).code,
                _ => ErrorCode::InvalidInput,
            };
            ServerError::new(code, e.to_string())
        })?;

        Ok(BatchResponse {
            request_id: request.request_id,
            output: format_results(&results),
            cases,
        })
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

/// Encode a queued frame.
fn encode_outbound(out: &Outbound) -> Result<Message, SimulationServerError> {
    match out {
        Outbound::Message(msg) => msg
            .to_json()
            .map(Message::Text)
            .map_err(|e| SimulationServerError::Internal(e.to_string())),
        Outbound::Binary(response) => response
            .to_bytes()
            .map(Message::Binary)
            .map_err(|e| SimulationServerError::Internal(e.to_string())),
    }
}

/// Log a request or response as JSON on the I/O target.
fn log_io_json<T: serde::Serialize>(what: &str, value: &T, elapsed: Option<Duration>) {
    let body = serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"));
    match elapsed {
        Some(elapsed) => info!(
            target: IO_LOG_TARGET,
            elapsed_us = elapsed.as_micros() as u64,
            "{}: {}",
            what,
            body,
        ),
        None => info!(target: IO_LOG_TARGET, "{}: {}", what, body),
    }
}
