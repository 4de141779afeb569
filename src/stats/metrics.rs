//! Relay counters
//!
//! Lock-free counters updated on the hot path and read as a plain
//! [`RelayStatsSnapshot`] for logging.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for signaling traffic through the hub
#[derive(Debug, Default)]
pub struct RelayStats {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    messages_relayed: AtomicU64,
    messages_dropped: AtomicU64,
    sdp_rewritten: AtomicU64,
    sdp_rewrite_failures: AtomicU64,
    joins_rejected: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    /// Transport connections accepted
    pub connections_opened: u64,
    /// Transport connections closed
    pub connections_closed: u64,
    /// Messages delivered to a peer's queue
    pub messages_relayed: u64,
    /// Messages for unknown or departed peers
    pub messages_dropped: u64,
    /// Session descriptions changed by the rewriter
    pub sdp_rewritten: u64,
    /// Session descriptions forwarded unmodified after a rewrite error
    pub sdp_rewrite_failures: u64,
    /// Joins refused because the room was full or the name taken
    pub joins_rejected: u64,
}

impl RelayStatsSnapshot {
    /// Connections currently open
    pub fn active_connections(&self) -> u64 {
        self.connections_opened.saturating_sub(self.connections_closed)
    }
}

impl RelayStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_relayed(&self) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sdp_rewritten(&self) {
        self.sdp_rewritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sdp_rewrite_failed(&self) {
        self.sdp_rewrite_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn join_rejected(&self) {
        self.joins_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            sdp_rewritten: self.sdp_rewritten.load(Ordering::Relaxed),
            sdp_rewrite_failures: self.sdp_rewrite_failures.load(Ordering::Relaxed),
            joins_rejected: self.joins_rejected.load(Ordering::Relaxed),
        }
    }
}
