//! Inbound and outbound signaling events

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::{IceServer, SignalMessage, TraceRecord};
use crate::registry::{user_id_from, ConnectionId, MediaKind};

/// Event names accepted from clients
pub const CLIENT_EVENTS: &[&str] = &[
    "message",
    "join",
    "create",
    "getRoomParticipants",
    "roomStatusUpdate",
    "shareScreen",
    "unshareScreen",
    "leave",
    "trace",
];

/// Event received from a client
///
/// `data` may be absent, `null` or an object for every event; the first
/// two read as `{}`. Events without arguments ignore `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Relay a payload to another connection
    Message(SignalMessage),
    /// Join (or switch to) a room
    Join(JoinRequest),
    /// Create a room, optionally with a requested name
    Create(CreateRequest),
    /// Describe the members of a room
    GetRoomParticipants(ParticipantsRequest),
    /// Correlate this connection with an application user
    RoomStatusUpdate(StatusUpdateRequest),
    /// Start offering a screen feed
    ShareScreen,
    /// Stop offering a feed (screen unless stated)
    UnshareScreen(UnshareRequest),
    /// Leave the current room
    Leave,
    /// Client-side WebRTC trace for diagnostics
    Trace(TraceRecord),
}

impl ClientEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Message(_) => "message",
            ClientEvent::Join(_) => "join",
            ClientEvent::Create(_) => "create",
            ClientEvent::GetRoomParticipants(_) => "getRoomParticipants",
            ClientEvent::RoomStatusUpdate(_) => "roomStatusUpdate",
            ClientEvent::ShareScreen => "shareScreen",
            ClientEvent::UnshareScreen(_) => "unshareScreen",
            ClientEvent::Leave => "leave",
            ClientEvent::Trace(_) => "trace",
        }
    }
}

/// `{"event": .., "data": ..}` before the payload is typed
#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

fn payload<T: DeserializeOwned, E: de::Error>(data: Value) -> Result<T, E> {
    let data = match data {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(data).map_err(E::custom)
}

impl<'de> Deserialize<'de> for ClientEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Envelope { event, data } = Envelope::deserialize(deserializer)?;

        Ok(match event.as_str() {
            "message" => ClientEvent::Message(payload(data)?),
            "join" => ClientEvent::Join(payload(data)?),
            "create" => ClientEvent::Create(payload(data)?),
            "getRoomParticipants" => ClientEvent::GetRoomParticipants(payload(data)?),
            "roomStatusUpdate" => ClientEvent::RoomStatusUpdate(payload(data)?),
            "shareScreen" => ClientEvent::ShareScreen,
            "unshareScreen" => ClientEvent::UnshareScreen(payload(data)?),
            "leave" => ClientEvent::Leave,
            "trace" => ClientEvent::Trace(payload(data)?),
            other => return Err(de::Error::unknown_variant(other, CLIENT_EVENTS)),
        })
    }
}

/// `userId` as a string or number; other types read as absent
fn lenient_user_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(user_id_from))
}

/// Feed type; an unknown kind reads as absent
fn lenient_kind<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<MediaKind>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub name: String,

    /// Caller metadata, exposed to peers as `extras`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantsRequest {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_user_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnshareRequest {
    #[serde(
        default,
        rename = "type",
        deserialize_with = "lenient_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<MediaKind>,
}

/// Event sent to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the id peers address it by
    Connect { id: ConnectionId },
    /// Configured STUN servers
    Stunservers(Vec<IceServer>),
    /// Configured TURN servers
    Turnservers(Vec<IceServer>),
    /// Relayed signaling message
    Message(SignalMessage),
    /// A peer left the room (`kind` unset) or stopped one feed
    Remove {
        id: ConnectionId,
        #[serde(rename = "type")]
        kind: Option<MediaKind>,
    },
    /// Reply to a request carrying an `ack` number
    Ack(Ack),
}

/// Callback reply: exactly one of `error` / `result` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub id: u64,
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl Ack {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            error: None,
            result: Some(result),
        }
    }

    pub fn err(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            error: Some(error.into()),
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "join",
            "data": {"name": "standup", "metadata": {"userId": "u1"}, "ack": 4}
        }))
        .unwrap();

        match event {
            ClientEvent::Join(req) => {
                assert_eq!(req.name, "standup");
                assert_eq!(req.ack, Some(4));
                assert_eq!(req.metadata.unwrap()["userId"], "u1");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unit_events() {
        let leave: ClientEvent = serde_json::from_str(r#"{"event":"leave"}"#).unwrap();
        assert_eq!(leave, ClientEvent::Leave);

        let share: ClientEvent = serde_json::from_str(r#"{"event":"shareScreen"}"#).unwrap();
        assert_eq!(share, ClientEvent::ShareScreen);
        assert_eq!(share.name(), "shareScreen");
    }

    #[test]
    fn test_parse_unshare_with_type() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"unshareScreen","data":{"type":"video"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::UnshareScreen(UnshareRequest {
                kind: Some(MediaKind::Video)
            })
        );
    }

    #[test]
    fn test_parse_status_update() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"roomStatusUpdate","data":{"roomName":"r","userId":"u"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::RoomStatusUpdate(StatusUpdateRequest {
                room_name: Some("r".into()),
                user_id: Some("u".into()),
            })
        );
    }

    #[test]
    fn test_data_absent_null_or_empty() {
        for data in ["", r#","data":null"#, r#","data":{}"#] {
            let parse = |event: &str| {
                serde_json::from_str::<ClientEvent>(&format!(r#"{{"event":"{}"{}}}"#, event, data))
                    .unwrap()
            };

            assert_eq!(parse("leave"), ClientEvent::Leave);
            assert_eq!(parse("shareScreen"), ClientEvent::ShareScreen);
            assert_eq!(
                parse("unshareScreen"),
                ClientEvent::UnshareScreen(UnshareRequest::default())
            );
            assert_eq!(parse("create"), ClientEvent::Create(CreateRequest::default()));
            assert_eq!(
                parse("roomStatusUpdate"),
                ClientEvent::RoomStatusUpdate(StatusUpdateRequest::default())
            );
            assert_eq!(
                parse("getRoomParticipants"),
                ClientEvent::GetRoomParticipants(ParticipantsRequest::default())
            );
        }
    }

    #[test]
    fn test_numeric_user_id_in_status_update() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"roomStatusUpdate","data":{"roomName":"r","userId":42}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::RoomStatusUpdate(StatusUpdateRequest {
                room_name: Some("r".into()),
                user_id: Some("42".into()),
            })
        );

        let nested: ClientEvent = serde_json::from_str(
            r#"{"event":"roomStatusUpdate","data":{"userId":{"id":1}}}"#,
        )
        .unwrap();
        assert_eq!(
            nested,
            ClientEvent::RoomStatusUpdate(StatusUpdateRequest::default())
        );
    }

    #[test]
    fn test_unknown_feed_type_reads_as_default() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"unshareScreen","data":{"type":"camera"}}"#).unwrap();
        assert_eq!(event, ClientEvent::UnshareScreen(UnshareRequest { kind: None }));
    }

    #[test]
    fn test_serialized_event_parses_back() {
        let event = ClientEvent::Join(JoinRequest {
            name: "r".into(),
            metadata: None,
            ack: Some(1),
        });
        let text = serde_json::to_string(&event).unwrap();
        assert_eq!(serde_json::from_str::<ClientEvent>(&text).unwrap(), event);
    }

    #[test]
    fn test_unknown_event_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event":"selfDestruct"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_serializes_null_type() {
        let event = ServerEvent::Remove {
            id: ConnectionId::from("abc"),
            kind: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "remove", "data": {"id": "abc", "type": null}})
        );

        let screen = ServerEvent::Remove {
            id: ConnectionId::from("abc"),
            kind: Some(MediaKind::Screen),
        };
        assert_eq!(serde_json::to_value(&screen).unwrap()["data"]["type"], "screen");
    }

    #[test]
    fn test_ack_shapes() {
        let value = serde_json::to_value(ServerEvent::Ack(Ack::err(3, "full"))).unwrap();
        assert_eq!(
            value,
            json!({"event": "ack", "data": {"id": 3, "error": "full", "result": null}})
        );
    }
}
