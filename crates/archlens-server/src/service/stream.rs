//! Status stream configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default interval between status store reads of one stream.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Configuration of the `/analyses/{id}/events` relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct StreamConfig {
    /// Milliseconds between two reads of the status store per connection
    #[cfg_attr(
        feature = "config",
        arg(long, env = "STREAM_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)
    )]
    pub stream_poll_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl StreamConfig {
    /// Creates a configuration polling every `interval`.
    pub fn with_poll_interval(interval: Duration) -> Self {
        Self {
            stream_poll_interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns the poll interval, never shorter than a millisecond.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.stream_poll_interval_ms.max(1))
    }
}
