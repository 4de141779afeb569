//! Signaling wire protocol
//!
//! Every WebSocket text frame carries one JSON object of the form
//! `{"event": <name>, "data": <payload>}`. Requests that expect a reply
//! include an `ack` number inside `data`; the server answers with an
//! [`ServerEvent::Ack`] carrying the same number.
//!
//! ```text
//!   client                                   server
//!     │ {"event":"join","data":{"name":"r1","ack":1}}
//!     │ ───────────────────────────────────────▶ │
//!     │ {"event":"ack","data":{"id":1,"error":null,"result":{"clients":{..}}}}
//!     │ ◀─────────────────────────────────────── │
//!     │ {"event":"message","data":{"to":"<peer>","payload":{"sdp":".."}}}
//!     │ ───────────────────────────────────────▶ │ ──▶ peer (from stamped)
//! ```

pub mod event;
pub mod message;

pub use event::{
    Ack, ClientEvent, CreateRequest, JoinRequest, ParticipantsRequest, ServerEvent,
    StatusUpdateRequest, UnshareRequest,
};
pub use message::{IceServer, IceUrls, SignalMessage, TraceRecord};
