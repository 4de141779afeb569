//! Connection registry
//!
//! The registry owns the state of every live connection and the room index
//! derived from it. Every other component reads and mutates connections
//! through it.
//!
//! # Architecture
//!
//! ```text
//!                       ConnectionRegistry
//!              ┌──────────────────────────────────┐
//!              │ connections: HashMap<Id, Entry { │
//!              │     membership, resources,       │
//!              │     metadata, outbox,            │
//!              │ }>                               │
//!              │ rooms: HashMap<Name, Set<Id>>    │
//!              └────────────────┬─────────────────┘
//!                               │
//!          ┌────────────────────┼────────────────────┐
//!          ▼                    ▼                    ▼
//!    RoomCoordinator       MessageRelay          SignalHub
//!    enter()/exit()        send()               register()/destroy()
//!    broadcast()
//! ```
//!
//! The room index is only ever changed together with the entry's
//! [`Membership`], so a connection's room always lists that connection.

pub mod entry;
pub mod store;

pub use entry::{
    user_id_from, user_id_of, ConnectionEntry, ConnectionId, MediaKind, MediaResources,
    Membership, Metadata, Outbox,
};
pub use store::ConnectionRegistry;
