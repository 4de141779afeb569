//! Per-connection entry
//!
//! This module defines the state the registry keeps for each live
//! connection: its address, room membership, media flags and metadata.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::protocol::ServerEvent;

/// Caller-supplied metadata, opaque to the relay
pub type Metadata = Map<String, Value>;

/// Sending half of a connection's outbound queue
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Unique, stable address of a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One media feed a connection may offer independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Screen,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Screen => "screen",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which feeds a connection currently offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResources {
    pub screen: bool,
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaResources {
    fn default() -> Self {
        Self {
            screen: false,
            video: true,
            audio: false,
        }
    }
}

impl MediaResources {
    pub fn get(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Screen => self.screen,
            MediaKind::Video => self.video,
            MediaKind::Audio => self.audio,
        }
    }

    pub fn set(&mut self, kind: MediaKind, value: bool) {
        match kind {
            MediaKind::Screen => self.screen = value,
            MediaKind::Video => self.video = value,
            MediaKind::Audio => self.audio = value,
        }
    }
}

/// Room membership of a connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Membership {
    /// Not in any room
    #[default]
    Unjoined,
    /// Member of the named room
    InRoom(String),
}

impl Membership {
    pub fn room(&self) -> Option<&str> {
        match self {
            Membership::Unjoined => None,
            Membership::InRoom(name) => Some(name),
        }
    }
}

/// Entry for a single connection in the registry
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Connection address
    pub id: ConnectionId,

    /// Current room membership
    membership: Membership,

    /// Offered media feeds
    pub resources: MediaResources,

    /// Metadata recorded at join time
    pub metadata: Metadata,

    /// Outbound queue drained by the connection's writer task
    outbox: Outbox,

    /// When the transport connected
    pub connected_at: Instant,
}

impl ConnectionEntry {
    pub(super) fn new(id: ConnectionId, outbox: Outbox) -> Self {
        Self {
            id,
            membership: Membership::Unjoined,
            resources: MediaResources::default(),
            metadata: Metadata::new(),
            outbox,
            connected_at: Instant::now(),
        }
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Name of the joined room, if any
    pub fn room(&self) -> Option<&str> {
        self.membership.room()
    }

    /// `userId` from the join metadata, stringified if numeric
    pub fn user_id(&self) -> Option<String> {
        user_id_of(&self.metadata)
    }

    /// `Unjoined -> InRoom(room)`; the registry exits any prior room first
    pub(super) fn enter(&mut self, room: String, metadata: Metadata) {
        self.membership = Membership::InRoom(room);
        self.metadata = metadata;
    }

    /// `InRoom(room) -> Unjoined`, returning the room left
    pub(super) fn exit(&mut self) -> Option<String> {
        match std::mem::take(&mut self.membership) {
            Membership::InRoom(room) => Some(room),
            Membership::Unjoined => None,
        }
    }

    /// Time since the transport connected
    pub fn uptime(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Queue an event for this connection
    ///
    /// Returns false if the writer side is already gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}

/// Extract `userId` from join metadata
pub fn user_id_of(metadata: &Metadata) -> Option<String> {
    user_id_from(metadata.get("userId")?)
}

/// A user id given as a string or a number; anything else is no id
pub fn user_id_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> (ConnectionEntry, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionEntry::new(ConnectionId::from("c1"), tx), rx)
    }

    #[test]
    fn test_default_resources() {
        let resources = MediaResources::default();
        assert!(!resources.screen);
        assert!(resources.video);
        assert!(!resources.audio);
    }

    #[test]
    fn test_membership_transitions() {
        let (mut entry, _rx) = entry();
        assert_eq!(entry.membership(), &Membership::Unjoined);
        assert_eq!(entry.exit(), None);

        entry.enter("r1".into(), Metadata::new());
        assert_eq!(entry.room(), Some("r1"));

        assert_eq!(entry.exit(), Some("r1".to_string()));
        assert_eq!(entry.membership(), &Membership::Unjoined);
    }

    #[test]
    fn test_user_id_forms() {
        let mut metadata = Metadata::new();
        assert_eq!(user_id_of(&metadata), None);

        metadata.insert("userId".into(), json!("alice"));
        assert_eq!(user_id_of(&metadata).as_deref(), Some("alice"));

        metadata.insert("userId".into(), json!(42));
        assert_eq!(user_id_of(&metadata).as_deref(), Some("42"));

        metadata.insert("userId".into(), json!({"nested": true}));
        assert_eq!(user_id_of(&metadata), None);

        assert_eq!(user_id_from(&json!(7)).as_deref(), Some("7"));
        assert_eq!(user_id_from(&json!(null)), None);
    }

    #[test]
    fn test_uptime_grows() {
        let (entry, _rx) = entry();
        let first = entry.uptime();
        std::thread::sleep(Duration::from_millis(5));
        assert!(entry.uptime() > first);
        assert!(entry.connected_at <= Instant::now());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (entry, rx) = entry();
        assert!(entry.send(ServerEvent::Connect {
            id: entry.id.clone()
        }));

        drop(rx);
        assert!(!entry.send(ServerEvent::Connect {
            id: entry.id.clone()
        }));
    }
}
