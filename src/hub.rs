//! Signal hub
//!
//! Owns the connection registry and routes every inbound event to the room
//! coordinator or the message relay. One async lock guards the registry,
//! so each event runs to completion before the next touches shared state.
//!
//! ```text
//!  reader task ──ClientEvent──▶ SignalHub::dispatch
//!                                  │ lock registry
//!                                  ├─ message ──▶ MessageRelay ──▶ target outbox
//!                                  └─ join/... ──▶ RoomCoordinator ──▶ room outboxes
//!                                                         │
//!                                  ack ◀──────────────────┘ (sender outbox)
//! ```

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::protocol::{Ack, ClientEvent, IceServer, ServerEvent, TraceRecord};
use crate::registry::{ConnectionId, ConnectionRegistry, Outbox};
use crate::relay::{MessageRelay, RelayOutcome};
use crate::room::{RoomCoordinator, RoomError, RoomObserver};
use crate::sdp::SdpRewriter;
use crate::server::config::ServerConfig;
use crate::stats::RelayStats;

/// Shared state behind every connection of one server
pub struct SignalHub<O: RoomObserver> {
    registry: Mutex<ConnectionRegistry>,
    coordinator: RoomCoordinator<O>,
    relay: MessageRelay,
    stats: RelayStats,
    stun_servers: Vec<IceServer>,
    turn_servers: Vec<IceServer>,
}

impl<O: RoomObserver> SignalHub<O> {
    /// Create a hub from server configuration
    pub fn new(config: &ServerConfig, observer: O) -> Self {
        Self {
            registry: Mutex::new(ConnectionRegistry::new()),
            coordinator: RoomCoordinator::new(config.rooms.clone(), observer),
            relay: MessageRelay::new(SdpRewriter::new(config.sdp_policy())),
            stats: RelayStats::new(),
            stun_servers: config.stun_servers.clone(),
            turn_servers: config.turn_servers.clone(),
        }
    }

    /// Get the relay counters
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Get the room coordinator
    pub fn coordinator(&self) -> &RoomCoordinator<O> {
        &self.coordinator
    }

    /// Number of registered connections
    pub async fn connection_count(&self) -> usize {
        self.registry.lock().await.connection_count()
    }

    /// Run a read-only query against the registry
    pub async fn inspect<R>(&self, f: impl FnOnce(&ConnectionRegistry) -> R) -> R {
        let registry = self.registry.lock().await;
        f(&registry)
    }

    /// Register a new connection and send its setup frames
    ///
    /// The connection receives `connect{id}`, then the STUN and TURN lists.
    pub async fn connect(&self, outbox: Outbox) -> ConnectionId {
        let mut registry = self.registry.lock().await;
        let id = registry.register(outbox);

        registry.send(&id, ServerEvent::Connect { id: id.clone() });
        registry.send(&id, ServerEvent::Stunservers(self.stun_servers.clone()));
        registry.send(&id, ServerEvent::Turnservers(self.turn_servers.clone()));

        self.stats.connection_opened();
        tracing::info!(connection = %id, total = registry.connection_count(), "Client connected");

        id
    }

    /// Handle one inbound event from `id`
    pub async fn dispatch(&self, id: &ConnectionId, event: ClientEvent) {
        tracing::trace!(connection = %id, event = event.name(), "Dispatching event");

        let mut registry = self.registry.lock().await;

        match event {
            ClientEvent::Message(message) => {
                self.count_relay(self.relay.relay(&registry, id, message));
            }

            ClientEvent::Join(request) => {
                let metadata = request.metadata.unwrap_or_default();
                let result = self
                    .coordinator
                    .join(&mut registry, id, &request.name, metadata)
                    .map(|snapshot| to_value(id, &snapshot));
                self.reply(&registry, id, request.ack, result);
            }

            ClientEvent::Create(request) => {
                let result = self
                    .coordinator
                    .create(&mut registry, id, request.name.as_deref())
                    .map(Value::String);
                self.reply(&registry, id, request.ack, result);
            }

            ClientEvent::GetRoomParticipants(request) => {
                let snapshot = self.coordinator.snapshot(&registry, &request.name);
                if let Some(ack) = request.ack {
                    registry.send(id, ServerEvent::Ack(Ack::ok(ack, to_value(id, &snapshot))));
                }
            }

            ClientEvent::RoomStatusUpdate(request) => {
                self.coordinator
                    .status_update(&registry, id, request.room_name, request.user_id);
            }

            ClientEvent::ShareScreen => {
                self.coordinator.share_screen(&mut registry, id);
            }

            ClientEvent::UnshareScreen(request) => {
                self.coordinator.unshare(&mut registry, id, request.kind);
            }

            ClientEvent::Leave => {
                self.coordinator.leave(&mut registry, id);
            }

            ClientEvent::Trace(record) => {
                drop(registry);
                log_trace(id, &record);
            }
        }
    }

    /// Tear down a connection whose transport closed
    pub async fn disconnect(&self, id: &ConnectionId) {
        let mut registry = self.registry.lock().await;
        let Some(uptime) = registry.get(id).map(|entry| entry.uptime()) else {
            return;
        };

        self.coordinator.disconnect(&mut registry, id);
        self.stats.connection_closed();

        tracing::info!(
            connection = %id,
            uptime_ms = uptime.as_millis() as u64,
            total = registry.connection_count(),
            "Client disconnected"
        );
    }

    fn reply(
        &self,
        registry: &ConnectionRegistry,
        id: &ConnectionId,
        ack: Option<u64>,
        result: Result<Value, RoomError>,
    ) {
        let ack_event = match result {
            Ok(value) => ack.map(|ack| Ack::ok(ack, value)),
            Err(e) if e.is_silent() => {
                tracing::debug!(connection = %id, error = %e, "Request ignored");
                None
            }
            Err(e) => {
                self.stats.join_rejected();
                tracing::info!(connection = %id, error = %e, "Request rejected");
                ack.map(|ack| Ack::err(ack, e.code()))
            }
        };

        if let Some(ack_event) = ack_event {
            registry.send(id, ServerEvent::Ack(ack_event));
        }
    }

    fn count_relay(&self, outcome: RelayOutcome) {
        match outcome {
            RelayOutcome::Delivered { rewritten } => {
                self.stats.message_relayed();
                if rewritten {
                    self.stats.sdp_rewritten();
                }
            }
            RelayOutcome::Passthrough(_) => {
                self.stats.message_relayed();
                self.stats.sdp_rewrite_failed();
            }
            RelayOutcome::Unreachable => self.stats.message_dropped(),
        }
    }
}

fn to_value<T: Serialize>(id: &ConnectionId, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(connection = %id, error = %e, "Failed to encode ack result");
        Value::Null
    })
}

fn log_trace(id: &ConnectionId, record: &TraceRecord) {
    tracing::info!(
        target: "signal_relay::trace",
        connection = %id,
        kind = %record.kind,
        session = %record.session,
        prefix = %record.prefix,
        peer = %record.peer,
        time = %record.time,
        value = %record.value,
        "{}",
        record.to_line()
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::protocol::{
        CreateRequest, JoinRequest, ParticipantsRequest, SignalMessage, StatusUpdateRequest,
        UnshareRequest,
    };
    use crate::registry::MediaKind;
    use crate::room::{NoopObserver, SocketUpdate};

    struct Client {
        id: ConnectionId,
        rx: mpsc::UnboundedReceiver<ServerEvent>,
    }

    impl Client {
        async fn connect<O: RoomObserver>(hub: &SignalHub<O>) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = hub.connect(tx).await;
            let mut client = Self { id, rx };
            client.drain();
            client
        }

        fn next(&mut self) -> ServerEvent {
            self.rx.try_recv().unwrap()
        }

        fn drain(&mut self) -> Vec<ServerEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }

        fn ack(&mut self) -> Ack {
            match self.next() {
                ServerEvent::Ack(ack) => ack,
                other => panic!("expected ack, got {:?}", other),
            }
        }
    }

    fn join(name: &str, ack: u64) -> ClientEvent {
        ClientEvent::Join(JoinRequest {
            name: name.into(),
            metadata: None,
            ack: Some(ack),
        })
    }

    fn hub(config: ServerConfig) -> SignalHub<NoopObserver> {
        SignalHub::new(&config, NoopObserver)
    }

    #[tokio::test]
    async fn test_connect_sends_setup_frames() {
        let config = ServerConfig::default().stun_servers(vec![IceServer::new("stun:a")]);
        let hub = hub(config);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.connect(tx).await;

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Connect { id: id.clone() });
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::Stunservers(vec![IceServer::new("stun:a")])
        );
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Turnservers(vec![]));
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_join_acks_snapshot() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        hub.dispatch(&a.id, join("r", 1)).await;
        let ack = a.ack();
        assert_eq!(ack.id, 1);
        assert_eq!(ack.result, Some(json!({"clients": {}})));

        hub.dispatch(&b.id, join("r", 2)).await;
        let ack = b.ack();
        let clients = &ack.result.unwrap()["clients"];
        assert_eq!(clients[a.id.as_str()]["video"], true);
        assert!(clients.get(b.id.as_str()).is_none());
    }

    #[tokio::test]
    async fn test_join_full_room() {
        let hub = hub(ServerConfig::default().max_clients(1));
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        hub.dispatch(&a.id, join("r", 1)).await;
        a.ack();

        hub.dispatch(&b.id, join("r", 7)).await;
        assert_eq!(b.ack(), Ack::err(7, "full"));

        assert_eq!(hub.inspect(|r| r.member_count("r")).await, 1);
        assert_eq!(hub.stats().snapshot().joins_rejected, 1);
    }

    #[tokio::test]
    async fn test_join_empty_name_is_silent() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;

        hub.dispatch(&a.id, join("", 1)).await;
        assert!(a.drain().is_empty());
        assert_eq!(hub.stats().snapshot().joins_rejected, 0);
    }

    #[tokio::test]
    async fn test_create_taken() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        let create = |ack| {
            ClientEvent::Create(CreateRequest {
                name: Some("standup".into()),
                ack: Some(ack),
            })
        };

        hub.dispatch(&a.id, create(1)).await;
        assert_eq!(a.ack(), Ack::ok(1, json!("standup")));

        hub.dispatch(&b.id, create(2)).await;
        assert_eq!(b.ack(), Ack::err(2, "taken"));
    }

    #[tokio::test]
    async fn test_create_generates_name() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;

        hub.dispatch(&a.id, ClientEvent::Create(CreateRequest { name: None, ack: Some(3) }))
            .await;
        let name = a.ack().result.unwrap();
        let name = name.as_str().unwrap();

        assert!(!name.is_empty());
        assert_eq!(hub.inspect(|r| r.room_of(&a.id).map(str::to_string)).await.as_deref(), Some(name));
    }

    #[tokio::test]
    async fn test_participants_query() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        hub.dispatch(&a.id, join("r", 1)).await;
        a.ack();

        let query = ClientEvent::GetRoomParticipants(ParticipantsRequest {
            name: "r".into(),
            ack: Some(9),
        });
        hub.dispatch(&b.id, query).await;

        let ack = b.ack();
        assert!(ack.result.unwrap()["clients"].get(a.id.as_str()).is_some());
    }

    #[tokio::test]
    async fn test_message_relay_counts() {
        let hub = hub(ServerConfig::default());
        let a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        let message = SignalMessage::to(b.id.clone(), json!({"candidate": "x"}));
        hub.dispatch(&a.id, ClientEvent::Message(message)).await;

        match b.next() {
            ServerEvent::Message(msg) => assert_eq!(msg.from, Some(a.id.clone())),
            other => panic!("unexpected event: {:?}", other),
        }

        let lost = SignalMessage::to(ConnectionId::from("gone"), json!({}));
        hub.dispatch(&a.id, ClientEvent::Message(lost)).await;

        let stats = hub.stats().snapshot();
        assert_eq!(stats.messages_relayed, 1);
        assert_eq!(stats.messages_dropped, 1);
    }

    #[tokio::test]
    async fn test_unshare_broadcasts_feed() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        hub.dispatch(&a.id, join("r", 1)).await;
        hub.dispatch(&b.id, join("r", 2)).await;
        a.drain();
        b.drain();

        hub.dispatch(&a.id, ClientEvent::ShareScreen).await;
        assert!(hub.inspect(|r| r.get(&a.id).unwrap().resources.screen).await);

        hub.dispatch(&a.id, ClientEvent::UnshareScreen(UnshareRequest::default()))
            .await;
        assert_eq!(
            b.next(),
            ServerEvent::Remove {
                id: a.id.clone(),
                kind: Some(MediaKind::Screen)
            }
        );
        assert!(a.drain().is_empty());
        assert_eq!(hub.inspect(|r| r.member_count("r")).await, 2);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_room() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;
        let mut c = Client::connect(&hub).await;

        for (client, ack) in [(&a, 1), (&b, 2), (&c, 3)] {
            hub.dispatch(&client.id, join("r", ack)).await;
        }
        a.drain();
        b.drain();
        c.drain();

        hub.disconnect(&a.id).await;
        // Second close is a no-op
        hub.disconnect(&a.id).await;

        let removed = ServerEvent::Remove {
            id: a.id.clone(),
            kind: None,
        };
        assert_eq!(b.drain(), vec![removed.clone()]);
        assert_eq!(c.drain(), vec![removed]);

        assert_eq!(hub.inspect(|r| r.member_count("r")).await, 2);
        let stats = hub.stats().snapshot();
        assert_eq!(stats.connections_closed, 1);
        assert_eq!(stats.active_connections(), 2);
    }

    #[tokio::test]
    async fn test_malformed_fmtp_counts_failure() {
        let config = ServerConfig::default().max_average_bitrate(20000);
        let hub = hub(config);
        let a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        let sdp = "v=0\r\nm=audio 9 RTP/AVP 111\r\na=rtpmap:111 opus/48000/2\r\na=fmtp:111 stereo\r\n";
        let message = SignalMessage::to(b.id.clone(), json!({"sdp": sdp}));
        hub.dispatch(&a.id, ClientEvent::Message(message)).await;

        match b.next() {
            ServerEvent::Message(msg) => assert_eq!(msg.sdp(), Some(sdp)),
            other => panic!("unexpected event: {:?}", other),
        }

        let stats = hub.stats().snapshot();
        assert_eq!(stats.messages_relayed, 1);
        assert_eq!(stats.sdp_rewritten, 0);
        assert_eq!(stats.sdp_rewrite_failures, 1);
    }

    #[derive(Default)]
    struct Departures(StdMutex<Vec<ConnectionId>>);

    impl RoomObserver for Departures {
        fn left_room(&self, connection: &ConnectionId) {
            self.0.lock().unwrap().push(connection.clone());
        }
    }

    #[tokio::test]
    async fn test_leave_notifies_room_and_observer() {
        let hub = SignalHub::new(&ServerConfig::default(), Departures::default());
        let mut a = Client::connect(&hub).await;
        let mut b = Client::connect(&hub).await;

        hub.dispatch(&a.id, join("r", 1)).await;
        hub.dispatch(&b.id, join("r", 2)).await;
        a.drain();
        b.drain();

        hub.dispatch(&a.id, ClientEvent::Leave).await;

        assert_eq!(
            b.drain(),
            vec![ServerEvent::Remove {
                id: a.id.clone(),
                kind: None
            }]
        );
        assert!(a.drain().is_empty());
        assert_eq!(hub.inspect(|r| r.member_count("r")).await, 1);
        assert!(hub.inspect(|r| r.room_of(&a.id).is_none()).await);
        assert_eq!(hub.connection_count().await, 2);

        let departed = hub.coordinator().observer().0.lock().unwrap().clone();
        assert_eq!(departed, vec![a.id.clone()]);
    }

    #[derive(Default)]
    struct Updates(StdMutex<Vec<SocketUpdate>>);

    impl RoomObserver for Updates {
        fn socket_update(&self, event: &SocketUpdate) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_status_update_reaches_observer() {
        let hub = SignalHub::new(&ServerConfig::default(), Updates::default());
        let a = Client::connect(&hub).await;

        let update = ClientEvent::RoomStatusUpdate(StatusUpdateRequest {
            room_name: Some("lobby".into()),
            user_id: Some("u7".into()),
        });
        hub.dispatch(&a.id, update).await;

        let updates = hub.coordinator().observer().0.lock().unwrap().clone();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].room_name.as_deref(), Some("lobby"));
        assert_eq!(updates[0].user_id.as_deref(), Some("u7"));
        assert_eq!(updates[0].connection_id, a.id);
    }

    #[tokio::test]
    async fn test_trace_has_no_reply() {
        let hub = hub(ServerConfig::default());
        let mut a = Client::connect(&hub).await;

        let record = TraceRecord {
            kind: json!("getstats"),
            session: json!("s1"),
            ..Default::default()
        };
        hub.dispatch(&a.id, ClientEvent::Trace(record)).await;

        assert!(a.drain().is_empty());
    }
}
