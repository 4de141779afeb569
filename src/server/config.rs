//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::IceServer;
use crate::room::RoomConfig;
use crate::sdp::{SdpPolicy, DEFAULT_CODEC_PRIORITY};

/// Default signaling port
pub const DEFAULT_PORT: u16 = 8888;

/// Server configuration options
///
/// Deserializes from JSON with camelCase keys; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Room membership policy
    pub rooms: RoomConfig,

    /// STUN servers sent to every client on connect
    #[serde(rename = "stunservers")]
    pub stun_servers: Vec<IceServer>,

    /// TURN servers sent to every client on connect
    #[serde(rename = "turnservers")]
    pub turn_servers: Vec<IceServer>,

    /// Preferred video codecs, highest priority first
    pub codec_priority: Vec<String>,

    /// Opus average bitrate cap in bits/sec (0 = no cap)
    #[serde(rename = "maxAverageBitRate")]
    pub max_average_bitrate: u64,

    /// Seconds between relay stats log lines (0 = never)
    pub stats_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_connections: 0,
            rooms: RoomConfig::default(),
            stun_servers: Vec::new(),
            turn_servers: Vec::new(),
            codec_priority: DEFAULT_CODEC_PRIORITY.iter().map(|c| c.to_string()).collect(),
            max_average_bitrate: 0,
            stats_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;

        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.codec_priority.iter().any(|c| c.is_empty()) {
            return Err(Error::Config("codecPriority entries must be non-empty".into()));
        }
        Ok(())
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the per-room member limit
    pub fn max_clients(mut self, max: usize) -> Self {
        self.rooms = self.rooms.max_clients(max);
        self
    }

    /// Replace the STUN server list
    pub fn stun_servers(mut self, servers: Vec<IceServer>) -> Self {
        self.stun_servers = servers;
        self
    }

    /// Replace the TURN server list
    pub fn turn_servers(mut self, servers: Vec<IceServer>) -> Self {
        self.turn_servers = servers;
        self
    }

    /// Set the video codec priority
    pub fn codec_priority<I, S>(mut self, codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codec_priority = codecs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the opus average bitrate cap
    pub fn max_average_bitrate(mut self, bitrate: u64) -> Self {
        self.max_average_bitrate = bitrate;
        self
    }

    /// Set the stats logging interval (zero disables it)
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval_secs = interval.as_secs();
        self
    }

    /// Stats logging interval, if enabled
    pub fn stats_period(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }

    /// SDP rewriting policy derived from this config
    pub fn sdp_policy(&self) -> SdpPolicy {
        SdpPolicy::default()
            .codec_priority(self.codec_priority.iter().cloned())
            .max_average_bitrate(self.max_average_bitrate)
    }
}
