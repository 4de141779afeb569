//! Room lifecycle observer
//!
//! Hooks for linking transport connections to application-level identity.
//! All methods have no-op defaults; implement the ones you need.

use serde::Serialize;

use crate::registry::ConnectionId;

/// A connection joined a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRoom {
    pub room_name: String,
    /// `userId` from the join metadata
    pub user_id: Option<String>,
    pub connection_id: ConnectionId,
}

/// A client reported which room and user a connection belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketUpdate {
    /// Current room, falling back to the reported one
    pub room_name: Option<String>,
    /// Join metadata `userId`, falling back to the reported one
    pub user_id: Option<String>,
    pub connection_id: ConnectionId,
}

/// Callbacks invoked by the room coordinator
///
/// Called while the registry lock is held: implementations must not block.
pub trait RoomObserver: Send + Sync + 'static {
    /// A connection joined a room
    fn joined_room(&self, _event: &JoinedRoom) {}

    /// A connection explicitly left its room
    fn left_room(&self, _connection: &ConnectionId) {}

    /// A connection's transport closed
    fn disconnected(&self, _connection: &ConnectionId) {}

    /// A client correlated its connection with a user
    fn socket_update(&self, _event: &SocketUpdate) {}
}

/// Observer that ignores every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RoomObserver for NoopObserver {}

/// Observer that logs every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RoomObserver for LoggingObserver {
    fn joined_room(&self, event: &JoinedRoom) {
        tracing::info!(
            room = %event.room_name,
            user = ?event.user_id,
            connection = %event.connection_id,
            "Joined room"
        );
    }

    fn left_room(&self, connection: &ConnectionId) {
        tracing::info!(connection = %connection, "Left room");
    }

    fn disconnected(&self, connection: &ConnectionId) {
        tracing::info!(connection = %connection, "Disconnected");
    }

    fn socket_update(&self, event: &SocketUpdate) {
        tracing::info!(
            room = ?event.room_name,
            user = ?event.user_id,
            connection = %event.connection_id,
            "Socket update"
        );
    }
}
