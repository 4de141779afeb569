//! Room coordinator implementation
//!
//! Applies membership policy on top of the connection registry. The
//! registry is passed into every call; the coordinator itself holds only
//! configuration and the observer.

use std::sync::Arc;

use super::config::RoomConfig;
use super::error::RoomError;
use super::observer::{JoinedRoom, RoomObserver, SocketUpdate};
use super::snapshot::{ClientDescription, RoomSnapshot};
use crate::protocol::ServerEvent;
use crate::registry::{user_id_of, ConnectionId, ConnectionRegistry, MediaKind, Metadata};

/// Room membership policy and broadcasts
pub struct RoomCoordinator<O: RoomObserver> {
    config: RoomConfig,
    observer: Arc<O>,
}

impl<O: RoomObserver> RoomCoordinator<O> {
    /// Create a coordinator with the given policy and observer
    pub fn new(config: RoomConfig, observer: O) -> Self {
        Self {
            config,
            observer: Arc::new(observer),
        }
    }

    /// Get the room configuration
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Get the observer
    pub fn observer(&self) -> &Arc<O> {
        &self.observer
    }

    /// Join a room, leaving the current one first
    ///
    /// Returns the room as it was before this connection entered (existing
    /// members only). A full room changes nothing.
    pub fn join(
        &self,
        registry: &mut ConnectionRegistry,
        id: &ConnectionId,
        name: &str,
        metadata: Metadata,
    ) -> Result<RoomSnapshot, RoomError> {
        if name.is_empty() {
            return Err(RoomError::InvalidName);
        }
        if !registry.contains(id) {
            return Err(RoomError::NotConnected);
        }

        let members = registry.member_count(name);
        if self.config.is_full(members) {
            tracing::debug!(
                room = %name,
                connection = %id,
                members = members,
                max_clients = self.config.max_clients,
                "Join rejected: room full"
            );
            return Err(RoomError::Full(name.to_string()));
        }

        self.remove_feed(registry, id, None);

        let snapshot = self.snapshot(registry, name);
        let user_id = user_id_of(&metadata);
        registry.enter(id, name, metadata);

        tracing::info!(
            room = %name,
            connection = %id,
            members = registry.member_count(name),
            "Connection joined room"
        );

        self.observer.joined_room(&JoinedRoom {
            room_name: name.to_string(),
            user_id,
            connection_id: id.clone(),
        });

        Ok(snapshot)
    }

    /// Leave the current room on the client's request
    ///
    /// The leave-observer is notified even when the connection was not in a
    /// room. Returns the room left.
    pub fn leave(&self, registry: &mut ConnectionRegistry, id: &ConnectionId) -> Option<String> {
        let room = self.remove_feed(registry, id, None);
        self.observer.left_room(id);
        room
    }

    /// Announce that a connection stopped one feed, or left entirely
    ///
    /// With `kind` set the connection stays in the room and the other
    /// members get `remove{id, type: kind}`. With `kind` unset the
    /// connection leaves and the remaining members get `remove{id, type:
    /// null}`. Returns the room concerned, `None` if not in one.
    pub fn remove_feed(
        &self,
        registry: &mut ConnectionRegistry,
        id: &ConnectionId,
        kind: Option<MediaKind>,
    ) -> Option<String> {
        let room = registry.room_of(id)?.to_string();

        let event = ServerEvent::Remove {
            id: id.clone(),
            kind,
        };
        let notified = registry.broadcast(&room, &event, Some(id));

        if kind.is_none() {
            registry.exit(id);
        }

        tracing::debug!(
            room = %room,
            connection = %id,
            feed = ?kind,
            notified = notified,
            "Remove broadcast"
        );

        Some(room)
    }

    /// Describe every member of a room
    ///
    /// A room with no members yields an empty snapshot.
    pub fn snapshot(&self, registry: &ConnectionRegistry, name: &str) -> RoomSnapshot {
        RoomSnapshot {
            clients: registry
                .room_entries(name)
                .map(|entry| (entry.id.clone(), ClientDescription::of(entry)))
                .collect(),
        }
    }

    /// Create a room and join it
    ///
    /// Without a requested name (or with an empty one) a random name is
    /// generated. A name that already has members is refused.
    pub fn create(
        &self,
        registry: &mut ConnectionRegistry,
        id: &ConnectionId,
        requested: Option<&str>,
    ) -> Result<String, RoomError> {
        let name = match requested {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        if registry.room_exists(&name) {
            tracing::debug!(room = %name, connection = %id, "Create rejected: name taken");
            return Err(RoomError::Taken(name));
        }

        self.join(registry, id, &name, Metadata::new())?;
        Ok(name)
    }

    /// Forward a room/user correlation to the observer
    ///
    /// Prefers what the registry knows over what the client reported.
    pub fn status_update(
        &self,
        registry: &ConnectionRegistry,
        id: &ConnectionId,
        room_name: Option<String>,
        user_id: Option<String>,
    ) {
        let entry = registry.get(id);

        let room_name = entry
            .and_then(|e| e.room())
            .map(str::to_string)
            .or(room_name);
        let user_id = entry.and_then(|e| e.user_id()).or(user_id);

        self.observer.socket_update(&SocketUpdate {
            room_name,
            user_id,
            connection_id: id.clone(),
        });
    }

    /// Mark the screen feed as offered
    pub fn share_screen(&self, registry: &mut ConnectionRegistry, id: &ConnectionId) {
        registry.set_resource(id, MediaKind::Screen, true);
    }

    /// Stop offering a feed (screen when unspecified) and tell the room
    pub fn unshare(
        &self,
        registry: &mut ConnectionRegistry,
        id: &ConnectionId,
        kind: Option<MediaKind>,
    ) {
        let kind = kind.unwrap_or(MediaKind::Screen);
        registry.set_resource(id, kind, false);
        self.remove_feed(registry, id, Some(kind));
    }

    /// Tear down a connection whose transport closed
    pub fn disconnect(&self, registry: &mut ConnectionRegistry, id: &ConnectionId) {
        self.remove_feed(registry, id, None);
        registry.destroy(id);
        self.observer.disconnected(id);
    }
}
