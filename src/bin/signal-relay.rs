//! `signal-relay [CONFIG]`
//!
//! Starts the signaling server, optionally loading a JSON config file.
//! Log verbosity follows `RUST_LOG` (default `info`).

use signal_relay::room::LoggingObserver;
use signal_relay::{ServerConfig, SignalServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(&path)?,
        None => ServerConfig::default(),
    };

    tracing::info!(
        addr = %config.bind_addr,
        max_clients = config.rooms.max_clients,
        max_connections = config.max_connections,
        "Starting signaling server"
    );

    let server = SignalServer::new(config, LoggingObserver);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
