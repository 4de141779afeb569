//! Room error types
//!
//! Error type for room coordinator operations. `Full` and `Taken` are
//! reported back to the requesting client; the others are dropped without
//! a reply.

/// Error type for room operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Room name was empty
    InvalidName,
    /// Connection is not registered
    NotConnected,
    /// Room is at its configured member limit
    Full(String),
    /// Requested room name already has members
    Taken(String),
}

impl RoomError {
    /// Short code sent to the client in the ack `error` field
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::InvalidName => "invalid",
            RoomError::NotConnected => "disconnected",
            RoomError::Full(_) => "full",
            RoomError::Taken(_) => "taken",
        }
    }

    /// Whether the request is ignored without replying to the caller
    pub fn is_silent(&self) -> bool {
        matches!(self, RoomError::InvalidName | RoomError::NotConnected)
    }
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomError::InvalidName => write!(f, "Room name must be a non-empty string"),
            RoomError::NotConnected => write!(f, "Connection is not registered"),
            RoomError::Full(room) => write!(f, "Room is full: {}", room),
            RoomError::Taken(room) => write!(f, "Room name is taken: {}", room),
        }
    }
}

impl std::error::Error for RoomError {}
