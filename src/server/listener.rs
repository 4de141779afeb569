//! Signaling server listener
//!
//! Handles the TCP accept loop and spawns a WebSocket handler per
//! connection.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::hub::SignalHub;
use crate::room::RoomObserver;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;

/// WebSocket signaling server
pub struct SignalServer<O: RoomObserver> {
    config: ServerConfig,
    hub: Arc<SignalHub<O>>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl<O: RoomObserver> SignalServer<O> {
    /// Create a new server with the given configuration and observer
    pub fn new(config: ServerConfig, observer: O) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let hub = Arc::new(SignalHub::new(&config, observer));

        Self {
            config,
            hub,
            connection_semaphore,
        }
    }

    /// Get the hub shared by all connections
    pub fn hub(&self) -> &Arc<SignalHub<O>> {
        &self.hub
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.run_with_listener(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown`
    pub async fn run_with_listener<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Signaling server listening");

        let stats_handle = self.spawn_stats_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        if let Some(handle) = stats_handle {
            handle.abort();
        }

        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        tracing::debug!(peer = %peer_addr, "New connection");

        if let Err(e) = socket.set_nodelay(true) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let hub = Arc::clone(&self.hub);

        tokio::spawn(async move {
            // Held for the connection's lifetime
            let _permit = permit;

            let connection = Connection::new(peer_addr, hub);
            if let Err(e) = connection.run(socket).await {
                tracing::debug!(peer = %peer_addr, error = %e, "Connection error");
            }

            tracing::debug!(peer = %peer_addr, "Connection closed");
        });
    }

    fn spawn_stats_task(&self) -> Option<JoinHandle<()>> {
        let period = self.config.stats_period()?;
        let hub = Arc::clone(&self.hub);

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let stats = hub.stats().snapshot();
                tracing::info!(
                    active = stats.active_connections(),
                    relayed = stats.messages_relayed,
                    dropped = stats.messages_dropped,
                    sdp_rewritten = stats.sdp_rewritten,
                    sdp_failures = stats.sdp_rewrite_failures,
                    joins_rejected = stats.joins_rejected,
                    "Relay stats"
                );
            }
        }))
    }
}
