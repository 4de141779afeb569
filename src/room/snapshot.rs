//! Room snapshot types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::{ConnectionEntry, ConnectionId, MediaResources, Metadata};

/// What peers learn about one room member
///
/// Serializes as `{"screen": .., "video": .., "audio": .., "extras": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDescription {
    #[serde(flatten)]
    pub resources: MediaResources,

    /// Metadata supplied at join time
    #[serde(default)]
    pub extras: Metadata,
}

impl ClientDescription {
    pub(crate) fn of(entry: &ConnectionEntry) -> Self {
        Self {
            resources: entry.resources,
            extras: entry.metadata.clone(),
        }
    }
}

/// Members of a room keyed by connection id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub clients: BTreeMap<ConnectionId, ClientDescription>,
}

impl RoomSnapshot {
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }
}
