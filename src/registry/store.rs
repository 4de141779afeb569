//! Connection registry implementation
//!
//! Owns every live connection and the room index derived from their
//! membership. Rooms are not stored objects: the index maps a room name to
//! the set of member ids and an entry disappears with its last member.

use std::collections::{BTreeSet, HashMap};

use super::entry::{ConnectionEntry, ConnectionId, MediaKind, Metadata, Outbox};
use crate::protocol::ServerEvent;
use crate::room::ClientDescription;

/// Store of live connections and derived room membership
///
/// Not internally synchronized; the owner serializes access.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Map of connection id to connection entry
    connections: HashMap<ConnectionId, ConnectionEntry>,

    /// Room name to member ids, kept in lockstep with entry membership
    rooms: HashMap<String, BTreeSet<ConnectionId>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection with a generated id
    pub fn register(&mut self, outbox: Outbox) -> ConnectionId {
        let mut id = ConnectionId::generate();
        while self.connections.contains_key(&id) {
            id = ConnectionId::generate();
        }

        self.connections
            .insert(id.clone(), ConnectionEntry::new(id.clone(), outbox));

        tracing::debug!(connection = %id, total = self.connections.len(), "Connection registered");
        id
    }

    /// Register a connection under a caller-chosen id
    ///
    /// Returns false (and changes nothing) if the id is already live.
    pub fn register_with_id(&mut self, id: ConnectionId, outbox: Outbox) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }

        self.connections
            .insert(id.clone(), ConnectionEntry::new(id, outbox));
        true
    }

    /// Get a connection entry
    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(id)
    }

    /// Check if a connection is live
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Room the connection is in, if any
    pub fn room_of(&self, id: &ConnectionId) -> Option<&str> {
        self.connections.get(id).and_then(|c| c.room())
    }

    /// Set one media flag; no-op for an unknown id
    pub fn set_resource(&mut self, id: &ConnectionId, kind: MediaKind, value: bool) -> bool {
        match self.connections.get_mut(id) {
            Some(entry) => {
                entry.resources.set(kind, value);
                true
            }
            None => false,
        }
    }

    /// Media flags and metadata of one connection
    pub fn snapshot(&self, id: &ConnectionId) -> Option<ClientDescription> {
        self.connections.get(id).map(ClientDescription::of)
    }

    /// Put the connection in `room`, leaving any prior room
    ///
    /// Returns the prior room, or `None` for an unknown id or an unjoined
    /// connection.
    pub fn enter(&mut self, id: &ConnectionId, room: &str, metadata: Metadata) -> Option<String> {
        if !self.connections.contains_key(id) {
            return None;
        }

        let prior = self.exit(id);

        if let Some(entry) = self.connections.get_mut(id) {
            entry.enter(room.to_string(), metadata);
            self.rooms
                .entry(room.to_string())
                .or_default()
                .insert(id.clone());
        }

        prior
    }

    /// Take the connection out of its room, returning the room left
    pub fn exit(&mut self, id: &ConnectionId) -> Option<String> {
        let room = self.connections.get_mut(id)?.exit()?;

        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(id);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }

        Some(room)
    }

    /// Drop a connection, exiting its room first
    ///
    /// Returns the entry together with the room it was in.
    pub fn destroy(&mut self, id: &ConnectionId) -> Option<(ConnectionEntry, Option<String>)> {
        let room = self.exit(id);
        let entry = self.connections.remove(id)?;

        tracing::debug!(
            connection = %id,
            room = ?room,
            total = self.connections.len(),
            "Connection destroyed"
        );

        Some((entry, room))
    }

    /// Member ids of a room, in id order
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of members in a room
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, BTreeSet::len)
    }

    /// A room exists while it has at least one member
    pub fn room_exists(&self, room: &str) -> bool {
        self.member_count(room) > 0
    }

    /// Number of non-empty rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Iterate member entries of a room
    pub fn room_entries<'a>(&'a self, room: &str) -> impl Iterator<Item = &'a ConnectionEntry> + 'a {
        self.rooms
            .get(room)
            .into_iter()
            .flat_map(|members| members.iter())
            .filter_map(|id| self.connections.get(id))
    }

    /// Queue an event for one connection
    ///
    /// Returns false if the connection is unknown or its writer is gone.
    pub fn send(&self, id: &ConnectionId, event: ServerEvent) -> bool {
        self.connections
            .get(id)
            .map(|entry| entry.send(event))
            .unwrap_or(false)
    }

    /// Queue an event for every member of a room except `except`
    ///
    /// Returns the number of members the event was queued for.
    pub fn broadcast(&self, room: &str, event: &ServerEvent, except: Option<&ConnectionId>) -> usize {
        let mut delivered = 0;
        for entry in self.room_entries(room) {
            if Some(&entry.id) == except {
                continue;
            }
            if entry.send(event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}
