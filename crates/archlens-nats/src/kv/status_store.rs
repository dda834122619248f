//! Job status records in a NATS KV bucket.

use std::time::Duration;

use archlens_core::store::StatusStore;
use archlens_core::types::{AnalysisId, AnalysisJob};

use super::{AnalysisKey, AnalysisStatusBucket, KvStore};
use crate::{NatsClient, Result, TRACING_TARGET_KV};

/// Status store backed by the `analysis_status` bucket.
///
/// Retention is enforced by the bucket's `max_age`, so records expire on the
/// server whether or not the job finished.
#[derive(Clone)]
pub struct NatsStatusStore {
    client: NatsClient,
    store: KvStore<AnalysisKey, AnalysisJob, AnalysisStatusBucket>,
    ttl: Duration,
}

impl NatsStatusStore {
    /// Opens the bucket, creating it with the given retention if missing.
    #[tracing::instrument(skip(client), target = TRACING_TARGET_KV)]
    pub async fn new(client: &NatsClient, ttl: Duration) -> Result<Self> {
        let store = client.kv_store(ttl).await?;

        tracing::info!(
            target: TRACING_TARGET_KV,
            bucket = %store.bucket_name(),
            ttl_secs = ttl.as_secs(),
            "Opened job status store"
        );

        Ok(Self {
            client: client.clone(),
            store,
            ttl,
        })
    }

    /// Returns the retention requested for the bucket.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait::async_trait]
impl StatusStore for NatsStatusStore {
    async fn put(&self, job: &AnalysisJob) -> archlens_core::Result<()> {
        self.store.put(&AnalysisKey::from(&job.id), job).await?;
        Ok(())
    }

    async fn get(&self, id: &AnalysisId) -> archlens_core::Result<Option<AnalysisJob>> {
        Ok(self.store.get(&AnalysisKey::from(id)).await?)
    }

    async fn ping(&self) -> archlens_core::Result<()> {
        self.client.ping().await?;
        Ok(())
    }
}
