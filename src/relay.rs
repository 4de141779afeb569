//! Peer-to-peer message relay
//!
//! Delivers a signaling message to the connection named in its `to` field,
//! stamping `from` and rewriting any session description on the way.
//! Delivery is best effort: a message for a peer that is gone is dropped.

use crate::protocol::{ServerEvent, SignalMessage};
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::sdp::{SdpError, SdpRewriter};

/// Result of relaying one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued for the target; `rewritten` if the SDP was changed
    Delivered { rewritten: bool },
    /// Queued with the original payload because rewriting failed
    Passthrough(SdpError),
    /// No `to`, or the target is not connected
    Unreachable,
}

impl RelayOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, RelayOutcome::Unreachable)
    }
}

/// Routes signaling payloads between connections
#[derive(Debug, Clone, Default)]
pub struct MessageRelay {
    rewriter: SdpRewriter,
}

impl MessageRelay {
    pub fn new(rewriter: SdpRewriter) -> Self {
        Self { rewriter }
    }

    pub fn rewriter(&self) -> &SdpRewriter {
        &self.rewriter
    }

    /// Relay `message` from `from` to `message.to`
    pub fn relay(
        &self,
        registry: &ConnectionRegistry,
        from: &ConnectionId,
        mut message: SignalMessage,
    ) -> RelayOutcome {
        let Some(to) = message.to.clone() else {
            tracing::debug!(from = %from, "Dropping message without target");
            return RelayOutcome::Unreachable;
        };

        if !registry.contains(&to) {
            tracing::debug!(from = %from, to = %to, "Dropping message for unknown peer");
            return RelayOutcome::Unreachable;
        }

        message.from = Some(from.clone());

        let outcome = match self.rewriter.rewrite_payload(&mut message.payload) {
            Ok(rewritten) => {
                if rewritten {
                    tracing::debug!(from = %from, to = %to, "Session description rewritten");
                }
                RelayOutcome::Delivered { rewritten }
            }
            Err(e) => {
                tracing::warn!(
                    from = %from,
                    to = %to,
                    error = %e,
                    "Session description rewrite failed, forwarding original"
                );
                RelayOutcome::Passthrough(e)
            }
        };

        if !registry.send(&to, ServerEvent::Message(message)) {
            tracing::debug!(from = %from, to = %to, "Peer writer closed, message dropped");
            return RelayOutcome::Unreachable;
        }

        outcome
    }
}
