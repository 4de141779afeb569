//! Statistics for signaling traffic

pub mod metrics;

pub use metrics::{RelayStats, RelayStatsSnapshot};
