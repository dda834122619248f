//! Status and result store capabilities.
//!
//! Both stores are injected as trait objects. The in-memory implementations
//! serve development and tests; durable ones live in the NATS and OpenDAL
//! integration crates.

mod memory;

pub use memory::{MemoryResultStore, MemoryStatusStore};

use crate::Result;
use crate::types::{AnalysisArtifact, AnalysisId, AnalysisJob, CacheKey, RepoIdentity};

/// Where a cached artifact was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    /// Cache key of the repository.
    pub key: CacheKey,
    /// Backend-specific location, e.g. `memory://acme/widgets`.
    pub uri: String,
}

/// Job id to latest job snapshot, with bounded retention.
///
/// Writes replace the whole record; a record expires once the retention
/// window passed since its last write.
#[async_trait::async_trait]
pub trait StatusStore: Send + Sync + 'static {
    /// Stores the job snapshot under its id.
    async fn put(&self, job: &AnalysisJob) -> Result<()>;

    /// Returns the latest snapshot, `None` when unknown or expired.
    async fn get(&self, id: &AnalysisId) -> Result<Option<AnalysisJob>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Repository identity to finished artifact.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync + 'static {
    /// Stores the artifact under the cache key of its repository.
    async fn put(&self, artifact: &AnalysisArtifact) -> Result<CacheLocation>;

    /// Returns the cached artifact of a repository.
    async fn get(&self, repo: &RepoIdentity) -> Result<Option<AnalysisArtifact>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
