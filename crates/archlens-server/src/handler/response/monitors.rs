//! Monitor response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Reachability of one backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentStatus {
    /// The store answered its ping.
    Healthy,
    /// The store failed its ping.
    Unavailable,
}

impl ComponentStatus {
    /// Maps a ping outcome.
    pub fn from_ping<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Self::Healthy
        } else {
            Self::Unavailable
        }
    }
}

/// System monitoring status response.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
    /// Whether every store is reachable.
    pub is_healthy: bool,
    /// Reachability of the status store.
    pub status_store: ComponentStatus,
    /// Reachability of the result store.
    pub result_store: ComponentStatus,
    /// Name of the active analyzer.
    pub analyzer: String,
    /// Application version.
    pub version: String,
}
