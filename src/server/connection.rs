//! Per-connection WebSocket handling
//!
//! Each connection runs two halves:
//!
//! - a reader loop (this task) that parses inbound frames into
//!   [`ClientEvent`]s and hands them to the hub in arrival order
//! - a writer task that drains the connection's outbox and serializes each
//!   [`ServerEvent`] into a text frame
//!
//! The hub only ever sees the outbox, so broadcasts never wait on a slow
//! socket.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use crate::error::Result;
use crate::hub::SignalHub;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::ConnectionId;
use crate::room::RoomObserver;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// One accepted client connection
pub struct Connection<O: RoomObserver> {
    peer_addr: SocketAddr,
    hub: Arc<SignalHub<O>>,
}

impl<O: RoomObserver> Connection<O> {
    pub fn new(peer_addr: SocketAddr, hub: Arc<SignalHub<O>>) -> Self {
        Self { peer_addr, hub }
    }

    /// Complete the WebSocket handshake and serve the connection until it
    /// closes
    pub async fn run(self, socket: TcpStream) -> Result<()> {
        let ws = accept_async(socket).await?;
        let (sink, source) = ws.split();

        let (outbox, rx) = mpsc::unbounded_channel();
        let id = self.hub.connect(outbox).await;

        tracing::debug!(connection = %id, peer = %self.peer_addr, "WebSocket established");

        let writer = tokio::spawn(write_loop(id.clone(), sink, rx));

        let result = self.read_loop(&id, source).await;

        self.hub.disconnect(&id).await;
        writer.abort();

        result
    }

    async fn read_loop(&self, id: &ConnectionId, mut source: WsSource) -> Result<()> {
        while let Some(frame) = source.next().await {
            match frame? {
                Message::Text(text) => self.handle_text(id, &text).await,
                Message::Binary(data) => match std::str::from_utf8(&data) {
                    Ok(text) => self.handle_text(id, text).await,
                    Err(_) => {
                        tracing::warn!(connection = %id, len = data.len(), "Ignoring binary frame");
                    }
                },
                Message::Close(_) => {
                    tracing::debug!(connection = %id, "Close frame received");
                    break;
                }
                // Pings are answered by tungstenite on the next read
                _ => {}
            }
        }

        Ok(())
    }

    async fn handle_text(&self, id: &ConnectionId, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.hub.dispatch(id, event).await,
            Err(e) => {
                tracing::warn!(connection = %id, error = %e, "Ignoring malformed frame");
            }
        }
    }
}

async fn write_loop(
    id: ConnectionId,
    mut sink: WsSink,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(connection = %id, error = %e, "Failed to encode event");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text)).await {
            tracing::debug!(connection = %id, error = %e, "WebSocket write failed");
            break;
        }
    }

    let _ = sink.close().await;
}
