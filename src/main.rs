//! Dodgeball Simulation Server
//!
//! Serves `RunSimulation` over WebSocket until Ctrl-C.

use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dodgeball::{
    VERSION,
    network::{SimulationServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env();

    info!("Dodgeball Server v{}", VERSION);
    info!("Max players per call: {}", config.max_players);
    if config.log_io {
        info!("Request/response logging enabled");
    }

    let server = Arc::new(SimulationServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_server.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.run().await?;

    info!("Server stopped");
    Ok(())
}
