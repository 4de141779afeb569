//! WebRTC signaling relay
//!
//! Brokers connection-setup messages between browser peers and groups them
//! into named rooms. Session descriptions are rewritten in flight to apply
//! a video codec preference and an opus bitrate cap.
//!
//! # Example
//!
//! ```no_run
//! use signal_relay::room::LoggingObserver;
//! use signal_relay::server::{ServerConfig, SignalServer};
//!
//! # async fn run() -> signal_relay::Result<()> {
//! let config = ServerConfig::default().max_clients(4);
//! let server = SignalServer::new(config, LoggingObserver);
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```

pub mod error;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod room;
pub mod sdp;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use hub::SignalHub;
pub use relay::{MessageRelay, RelayOutcome};
pub use server::{ServerConfig, SignalServer};
