//! WebSocket signaling server
//!
//! The listener accepts TCP connections, upgrades them to WebSocket and
//! gives each one a reader loop and a writer task. All connections share
//! one [`SignalHub`](crate::hub::SignalHub).

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::SignalServer;
