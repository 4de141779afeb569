//! Message bodies shared by inbound and outbound events

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::ConnectionId;

/// Peer-to-peer signaling envelope
///
/// Only `to`, `from` and `payload.sdp` are interpreted by the relay. Every
/// other field (`type`, `roomType`, `sid`, `prefix`, ...) is carried through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    /// Target connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ConnectionId>,

    /// Sending connection, stamped by the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ConnectionId>,

    /// Opaque payload; may carry an `sdp` string
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,

    /// Remaining envelope fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignalMessage {
    /// Create a message addressed to `to`
    pub fn to(to: ConnectionId, payload: Value) -> Self {
        Self {
            to: Some(to),
            from: None,
            payload,
            extra: Map::new(),
        }
    }

    /// Session description carried by the payload, if any
    pub fn sdp(&self) -> Option<&str> {
        self.payload.get("sdp").and_then(Value::as_str)
    }
}

/// STUN/TURN server entry handed to clients at connect time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServer {
    #[serde(alias = "url")]
    pub urls: IceUrls,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// Entry with a single URL and no credentials
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: IceUrls::One(url.into()),
            username: None,
            credential: None,
        }
    }

    /// Attach static credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.credential = Some(credential.into());
        self
    }
}

/// `urls` may be a single string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IceUrls {
    One(String),
    Many(Vec<String>),
}

/// Client-side WebRTC trace record, logged verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(default, rename = "type")]
    pub kind: Value,
    #[serde(default)]
    pub session: Value,
    #[serde(default)]
    pub prefix: Value,
    #[serde(default)]
    pub peer: Value,
    #[serde(default)]
    pub time: Value,
    #[serde(default)]
    pub value: Value,
}

impl TraceRecord {
    /// The record as the compact array `[type, session, prefix, peer, time, value]`
    pub fn to_line(&self) -> String {
        Value::Array(vec![
            self.kind.clone(),
            self.session.clone(),
            self.prefix.clone(),
            self.peer.clone(),
            self.time.clone(),
            self.value.clone(),
        ])
        .to_string()
    }
}
