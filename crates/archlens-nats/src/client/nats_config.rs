//! NATS connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for NATS connections with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-url", env = "NATS_URL", default_value = "nats://127.0.0.1:4222")
    )]
    pub nats_url: String,

    /// Authentication token
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Client connection name for debugging and monitoring
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-client-name", env = "NATS_CLIENT_NAME")
    )]
    pub nats_client_name: Option<String>,

    /// Connection timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS")
    )]
    pub nats_connect_timeout: Option<u64>,

    /// Maximum number of reconnection attempts (0 = unlimited)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-max-reconnects", env = "NATS_MAX_RECONNECTS")
    )]
    pub nats_max_reconnects: Option<usize>,
}

// Default values
const DEFAULT_NAME: &str = "archlens";
const DEFAULT_MAX_RECONNECTS: usize = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 2;
const DEFAULT_PING_INTERVAL_SECS: u64 = 30;

impl Default for NatsConfig {
    fn default() -> Self {
        Self::new("nats://127.0.0.1:4222")
    }
}

impl NatsConfig {
    /// Creates a configuration for the given server URL(s), without a token.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            nats_url: server_url.into(),
            nats_token: None,
            nats_client_name: None,
            nats_connect_timeout: None,
            nats_max_reconnects: None,
        }
    }

    /// Returns the client name, using the default if not set.
    #[inline]
    pub fn name(&self) -> &str {
        self.nats_client_name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Returns the server URLs (splits comma-separated URLs).
    pub fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }

    /// Returns the connection timeout.
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.nats_connect_timeout
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Returns the initial reconnect delay.
    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS)
    }

    /// Returns the ping interval.
    #[inline]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(DEFAULT_PING_INTERVAL_SECS)
    }

    /// Returns the max reconnects as Option (0 means unlimited).
    #[inline]
    pub fn max_reconnects_option(&self) -> Option<usize> {
        let max = self.nats_max_reconnects.unwrap_or(DEFAULT_MAX_RECONNECTS);
        if max == 0 { None } else { Some(max) }
    }

    /// Set the authentication token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.nats_token = Some(token.into());
        self
    }

    /// Set the client connection name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.nats_client_name = Some(name.into());
        self
    }

    /// Set the connection timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = Some(secs);
        self
    }

    /// Set maximum reconnection attempts (0 for unlimited).
    #[must_use]
    pub fn with_max_reconnects(mut self, max_reconnects: usize) -> Self {
        self.nats_max_reconnects = Some(max_reconnects);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for server in self.servers() {
            if server.is_empty() {
                return Err(Error::invalid_config("server URL cannot be empty"));
            }
            if !server.starts_with("nats://") && !server.starts_with("tls://") {
                return Err(Error::invalid_config(format!(
                    "invalid server URL format: {server}"
                )));
            }
        }

        if self.nats_token.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_config("token cannot be empty when set"));
        }

        Ok(())
    }
}
