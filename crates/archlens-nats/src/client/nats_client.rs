//! NATS client wrapper and connection management.
//!
//! The underlying `async-nats` client multiplexes every operation over one
//! TCP connection and is cheap to clone, so a single `NatsClient` is shared
//! by all stores of a process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_nats::{Client, ConnectOptions, jetstream};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::kv::{KvBucket, KvKey, KvStore};
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// Upper bound of the reconnect backoff.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Timeout of a connectivity check.
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// NATS client wrapper with connection management.
///
/// Cheaply cloneable; clones share the same connection.
#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<NatsClientInner>,
}

#[derive(Debug)]
struct NatsClientInner {
    client: Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Creates a new NATS client and connects.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION)]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            servers = %config.nats_url,
            "Connecting to NATS servers"
        );

        let mut connect_opts = ConnectOptions::new()
            .name(config.name())
            .ping_interval(config.ping_interval())
            .connection_timeout(config.connect_timeout());

        if let Some(token) = config.nats_token.clone() {
            connect_opts = connect_opts.token(token);
        }

        if let Some(max_reconnects) = config.max_reconnects_option() {
            connect_opts = connect_opts.max_reconnects(max_reconnects);
        }

        let base_delay = config.reconnect_delay();
        connect_opts = connect_opts.reconnect_delay_callback(move |attempts| {
            base_delay
                .saturating_mul(2_u32.saturating_pow(attempts.min(16) as u32))
                .min(MAX_RECONNECT_DELAY)
        });

        let connect_timeout = config.connect_timeout();
        let client = timeout(
            connect_timeout,
            async_nats::connect_with_options(config.nats_url.as_str(), connect_opts),
        )
        .await
        .map_err(|_| Error::timeout(connect_timeout))?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let jetstream = jetstream::new(client.clone());

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_host = %server_info.host,
            server_version = %server_info.version,
            max_payload = server_info.max_payload,
            "Successfully connected to NATS"
        );

        Ok(Self {
            inner: Arc::new(NatsClientInner {
                client,
                jetstream,
                config,
            }),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &NatsConfig {
        &self.inner.config
    }

    /// Tests connectivity by flushing the connection.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();

        timeout(PING_TIMEOUT, self.inner.client.flush())
            .await
            .map_err(|_| Error::timeout(PING_TIMEOUT))?
            .map_err(|e| Error::Connection(Box::new(e)))?;

        let ping_time = start.elapsed();
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            duration_ms = ping_time.as_millis(),
            "NATS ping successful"
        );
        Ok(ping_time)
    }

    /// Opens a typed KV bucket, creating it with `ttl` retention if missing.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn kv_store<K, V, B>(&self, ttl: Duration) -> Result<KvStore<K, V, B>>
    where
        K: KvKey,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        B: KvBucket,
    {
        KvStore::open(&self.inner.jetstream, ttl).await
    }
}
