//! Cached artifacts as JSON documents in a blob backend.

use archlens_core::store::{CacheLocation, ResultStore};
use archlens_core::types::{AnalysisArtifact, CacheKey, RepoIdentity};

use crate::backend::StorageBackend;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::TRACING_TARGET;

/// Directory holding one document per repository.
const ARTIFACT_PREFIX: &str = "artifacts";

/// Result store writing `artifacts/{owner}/{name}.json`.
#[derive(Debug, Clone)]
pub struct OpendalResultStore {
    backend: StorageBackend,
}

impl OpendalResultStore {
    /// Wraps an existing backend.
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }

    /// Creates the backend from configuration.
    pub fn from_config(config: StorageConfig) -> StorageResult<Self> {
        StorageBackend::new(config).map(Self::new)
    }

    /// Returns the underlying backend.
    #[inline]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Returns the document path of a cache key.
    pub fn path(key: &CacheKey) -> String {
        let (owner, name) = key.segments();
        format!("{ARTIFACT_PREFIX}/{owner}/{name}.json")
    }

    /// Removes the cached artifact of a repository.
    pub async fn evict(&self, repo: &RepoIdentity) -> StorageResult<()> {
        let path = Self::path(&repo.cache_key());
        self.backend.delete(&path).await
    }
}

#[async_trait::async_trait]
impl ResultStore for OpendalResultStore {
    async fn put(&self, artifact: &AnalysisArtifact) -> archlens_core::Result<CacheLocation> {
        let key = artifact.repo_identity.cache_key();
        let path = Self::path(&key);
        let document = serde_json::to_vec(artifact)?;
        let size = document.len();

        self.backend.write(&path, document).await?;

        tracing::info!(
            target: TRACING_TARGET,
            cache_key = %key,
            path = %path,
            size = size,
            "Cached artifact"
        );

        Ok(CacheLocation {
            uri: self.backend.uri(&path),
            key,
        })
    }

    async fn get(&self, repo: &RepoIdentity) -> archlens_core::Result<Option<AnalysisArtifact>> {
        let path = Self::path(&repo.cache_key());
        let Some(document) = self.backend.read(&path).await? else {
            return Ok(None);
        };

        let artifact = serde_json::from_slice(&document)
            .map_err(|source| StorageError::corrupt(&path, source))?;
        Ok(Some(artifact))
    }

    async fn ping(&self) -> archlens_core::Result<()> {
        self.backend.check().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use archlens_core::ErrorKind;
    use archlens_core::analyzer::placeholder_artifact;
    use jiff::Timestamp;

    use super::*;

    fn repo(owner: &str, name: &str) -> RepoIdentity {
        RepoIdentity::new(owner, name).unwrap()
    }

    #[tokio::test]
    async fn stores_one_artifact_per_repository() {
        let store = OpendalResultStore::from_config(StorageConfig::memory()).unwrap();
        let first = placeholder_artifact(&repo("acme", "widgets"), Timestamp::UNIX_EPOCH);

        let location = store.put(&first).await.unwrap();
        assert_eq!(location.key.as_str(), "acme/widgets");
        assert_eq!(location.uri, "memory://artifacts/acme/widgets.json");

        let mut second = first.clone();
        second.diagram = "graph TD\nA --> B".to_owned();
        store.put(&second).await.unwrap();

        let read = store.get(&repo("Acme", "Widgets")).await.unwrap();
        assert_eq!(read, Some(second));
        assert!(store.get(&repo("acme", "gadgets")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn survives_reopening_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().display().to_string();
        let artifact = placeholder_artifact(&repo("acme", "widgets"), Timestamp::UNIX_EPOCH);

        let store = OpendalResultStore::from_config(StorageConfig::fs(&root)).unwrap();
        store.put(&artifact).await.unwrap();
        drop(store);

        let reopened = OpendalResultStore::from_config(StorageConfig::fs(&root)).unwrap();
        let read = reopened.get(&repo("acme", "widgets")).await.unwrap();
        assert_eq!(read, Some(artifact));

        reopened.evict(&repo("acme", "widgets")).await.unwrap();
        assert!(reopened.get(&repo("acme", "widgets")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_documents_are_errors() {
        let store = OpendalResultStore::from_config(StorageConfig::memory()).unwrap();
        store
            .backend()
            .write("artifacts/acme/widgets.json", b"not json".to_vec())
            .await
            .unwrap();

        let error = store.get(&repo("acme", "widgets")).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Serialization);
    }
}
