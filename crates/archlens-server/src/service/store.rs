//! Selection of the status and result store backends.

use std::sync::Arc;
use std::time::Duration;

use archlens_core::store::{MemoryResultStore, MemoryStatusStore, ResultStore, StatusStore};
use archlens_nats::{NatsClient, NatsConfig, NatsStatusStore};
use archlens_opendal::{BackendType, OpendalResultStore, StorageConfig};
#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TRACING_TARGET_SERVICE};

/// Default retention of job snapshots.
pub const DEFAULT_STATUS_TTL_SECS: u64 = 3600;

/// Backend of the status store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusBackend {
    /// Process-local map; snapshots vanish on restart.
    #[default]
    Memory,
    /// NATS JetStream key-value bucket.
    Nats,
}

/// Store selection, made once at startup.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct StoreConfig {
    /// Status store backend
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "ARCHLENS_STATUS_BACKEND",
            value_enum,
            default_value_t = StatusBackend::Memory
        )
    )]
    pub status_backend: StatusBackend,

    /// Retention of job snapshots in seconds, finished or not
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ARCHLENS_STATUS_TTL_SECS", default_value_t = DEFAULT_STATUS_TTL_SECS)
    )]
    pub status_ttl_secs: u64,

    #[cfg_attr(feature = "config", command(flatten))]
    pub result: StorageConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    pub nats: NatsConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            status_backend: StatusBackend::default(),
            status_ttl_secs: DEFAULT_STATUS_TTL_SECS,
            result: StorageConfig::default(),
            nats: NatsConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the snapshot retention window.
    #[inline]
    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    /// Opens the configured status store.
    ///
    /// The NATS backend connects eagerly so misconfiguration fails startup.
    pub async fn open_status_store(&self) -> Result<Arc<dyn StatusStore>> {
        let ttl = self.status_ttl();

        let store: Arc<dyn StatusStore> = match self.status_backend {
            StatusBackend::Memory => Arc::new(MemoryStatusStore::new(ttl)),
            StatusBackend::Nats => {
                let client = NatsClient::connect(self.nats.clone()).await?;
                Arc::new(NatsStatusStore::new(&client, ttl).await?)
            }
        };

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            backend = %self.status_backend,
            ttl_secs = ttl.as_secs(),
            "Status store ready"
        );

        Ok(store)
    }

    /// Opens the configured result store.
    pub fn open_result_store(&self) -> Result<Arc<dyn ResultStore>> {
        let store: Arc<dyn ResultStore> = match self.result.backend_type {
            BackendType::Memory => Arc::new(MemoryResultStore::new()),
            BackendType::Fs => Arc::new(OpendalResultStore::from_config(self.result.clone())?),
        };

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            backend = %self.result.backend_type,
            "Result store ready"
        );

        Ok(store)
    }

    /// Checks values that clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.status_ttl_secs == 0 {
            return Err(Error::config("status retention must be at least one second"));
        }

        if self.result.backend_type == BackendType::Fs && self.result.root.trim().is_empty() {
            return Err(Error::config("the fs result backend requires --result-root"));
        }

        Ok(())
    }
}
