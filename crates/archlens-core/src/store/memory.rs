//! In-memory store implementations.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheLocation, ResultStore, StatusStore};
use crate::types::{AnalysisArtifact, AnalysisId, AnalysisJob, CacheKey, RepoIdentity};
use crate::{Result, TRACING_TARGET_STORE};

/// Default retention of job records.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(60 * 60);

/// Status store keeping job snapshots in a map with lazy expiry.
#[derive(Debug)]
pub struct MemoryStatusStore {
    entries: RwLock<HashMap<AnalysisId, (Instant, AnalysisJob)>>,
    ttl: Duration,
}

impl MemoryStatusStore {
    /// Creates a store with the given retention window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the retention window.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the number of records, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

#[async_trait::async_trait]
impl StatusStore for MemoryStatusStore {
    async fn put(&self, job: &AnalysisJob) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let ttl = self.ttl;
        entries.retain(|_, (written, _)| now.duration_since(*written) < ttl);
        entries.insert(job.id, (now, job.clone()));

        tracing::trace!(
            target: TRACING_TARGET_STORE,
            analysis_id = %job.id,
            phase = %job.status.phase,
            progress = job.status.progress,
            "Stored job status"
        );

        Ok(())
    }

    async fn get(&self, id: &AnalysisId) -> Result<Option<AnalysisJob>> {
        let entries = self.entries.read().await;
        let job = entries
            .get(id)
            .filter(|(written, _)| written.elapsed() < self.ttl)
            .map(|(_, job)| job.clone());

        Ok(job)
    }
}

/// Result store keeping artifacts in a map keyed by repository.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: RwLock<HashMap<CacheKey, AnalysisArtifact>>,
}

impl MemoryResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, artifact: &AnalysisArtifact) -> Result<CacheLocation> {
        let key = artifact.repo_identity.cache_key();
        self.entries
            .write()
            .await
            .insert(key.clone(), artifact.clone());

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            cache_key = %key,
            flows = artifact.flows.len(),
            "Cached artifact in memory"
        );

        Ok(CacheLocation {
            uri: format!("memory://{key}"),
            key,
        })
    }

    async fn get(&self, repo: &RepoIdentity) -> Result<Option<AnalysisArtifact>> {
        Ok(self.entries.read().await.get(&repo.cache_key()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::types::Phase;

    fn repo() -> RepoIdentity {
        RepoIdentity::new("acme", "widgets").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn status_round_trip_and_expiry() {
        let store = MemoryStatusStore::new(Duration::from_secs(60));
        let mut job = AnalysisJob::new(repo());
        store.put(&job).await.unwrap();

        job.advance(Phase::Extracting, 30, "extracting").unwrap();
        store.put(&job).await.unwrap();
        let read = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(read.status.phase, Phase::Extracting);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get(&job.id).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get(&job.id).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn writes_refresh_retention_and_purge_expired() {
        let store = MemoryStatusStore::new(Duration::from_secs(10));
        let old = AnalysisJob::new(repo());
        let mut fresh = AnalysisJob::new(repo());
        store.put(&old).await.unwrap();
        store.put(&fresh).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        fresh.advance(Phase::Analyzing, 50, "analyzing").unwrap();
        store.put(&fresh).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(store.get(&old.id).await.unwrap().is_none());
        assert!(store.get(&fresh.id).await.unwrap().is_some());

        store.put(&fresh).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_job_is_none() {
        let store = MemoryStatusStore::default();
        assert!(store.get(&AnalysisId::new_v7()).await.unwrap().is_none());
        assert!(store.is_empty().await);
        assert_eq!(store.ttl(), DEFAULT_STATUS_TTL);
    }

    #[tokio::test]
    async fn results_are_keyed_case_insensitively() {
        let store = MemoryResultStore::new();
        let artifact = crate::analyzer::placeholder_artifact(&repo(), Timestamp::UNIX_EPOCH);

        let location = store.put(&artifact).await.unwrap();
        assert_eq!(location.uri, "memory://acme/widgets");

        let upper = RepoIdentity::new("ACME", "Widgets").unwrap();
        assert_eq!(store.get(&upper).await.unwrap(), Some(artifact));

        let other = RepoIdentity::new("acme", "gadgets").unwrap();
        assert!(store.get(&other).await.unwrap().is_none());
    }
}
