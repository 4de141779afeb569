//! Room policy configuration

use serde::{Deserialize, Serialize};

/// Configuration for room membership policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomConfig {
    /// Maximum members per room (0 = unlimited)
    pub max_clients: usize,
}

impl RoomConfig {
    /// Set the per-room member limit
    pub fn max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Whether a room holding `members` connections refuses another join
    pub fn is_full(&self, members: usize) -> bool {
        self.max_clients > 0 && members >= self.max_clients
    }
}
