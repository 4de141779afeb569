//! Room coordination
//!
//! Join/leave/capacity policy, room snapshots, and the `remove`
//! broadcasts that keep peers' views of a room consistent.
//!
//! A connection moves `Unjoined -> InRoom(name) -> Unjoined`. Joining while
//! in a room leaves the old room first, so a connection is never in two
//! rooms.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod snapshot;

pub use config::RoomConfig;
pub use coordinator::RoomCoordinator;
pub use error::RoomError;
pub use observer::{JoinedRoom, LoggingObserver, NoopObserver, RoomObserver, SocketUpdate};
pub use snapshot::{ClientDescription, RoomSnapshot};
