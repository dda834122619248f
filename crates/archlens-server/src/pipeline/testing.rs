//! Collaborator doubles shared by pipeline and handler tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use archlens_core::analyzer::placeholder_artifact;
use archlens_core::prelude::*;
use bytes::Bytes;
use jiff::Timestamp;
use tokio::sync::Notify;

/// Fetcher serving a fixed set of files.
pub(crate) struct StaticFetcher {
    files: Vec<SourceFile>,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
}

impl StaticFetcher {
    /// Serves a small Rust project.
    pub fn new() -> Self {
        Self {
            files: vec![
                SourceFile::new("Cargo.toml", "[package]\nname = \"widgets\""),
                SourceFile::new("src/main.rs", "fn main() {}"),
            ],
            failure: None,
            gate: None,
        }
    }

    /// Fails every download with a network error.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_owned()),
            ..Self::new()
        }
    }

    /// Holds every download until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    /// Serves an archive without readable files.
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            ..Self::new()
        }
    }
}

#[async_trait::async_trait]
impl SourceFetcher for StaticFetcher {
    async fn download(&self, _repo: &RepoIdentity) -> Result<Bytes> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.failure {
            Some(message) => Err(Error::network_error().with_message(message.clone())),
            None => Ok(Bytes::from_static(b"tarball")),
        }
    }

    async fn extract(&self, _archive: Bytes) -> Result<SourceArchive> {
        Ok(SourceArchive {
            files: self.files.clone(),
            skipped: 0,
        })
    }
}

/// Status store remembering the phase and progress of every write.
pub(crate) struct RecordingStatusStore {
    store: MemoryStatusStore,
    writes: Mutex<Vec<(Phase, u8)>>,
}

impl RecordingStatusStore {
    pub fn new() -> Self {
        Self {
            store: MemoryStatusStore::new(Duration::from_secs(3600)),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Returns the writes in the order they happened.
    pub fn writes(&self) -> Vec<(Phase, u8)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StatusStore for RecordingStatusStore {
    async fn put(&self, job: &AnalysisJob) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((job.status.phase, job.status.progress));
        self.store.put(job).await
    }

    async fn get(&self, id: &AnalysisId) -> Result<Option<AnalysisJob>> {
        self.store.get(id).await
    }
}

/// Analyzer failing every request with an upstream error.
pub(crate) struct FailingAnalyzer(pub &'static str);

#[async_trait::async_trait]
impl Analyzer for FailingAnalyzer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn analyze(
        &self,
        _repo: &RepoIdentity,
        _source: &SourceArchive,
    ) -> Result<AnalysisArtifact> {
        Err(Error::external_error().with_message(self.0))
    }
}

/// Analyzer whose first flow skips from step 1 to step 3.
pub(crate) struct GappedAnalyzer;

#[async_trait::async_trait]
impl Analyzer for GappedAnalyzer {
    fn name(&self) -> &str {
        "gapped"
    }

    async fn analyze(
        &self,
        repo: &RepoIdentity,
        _source: &SourceArchive,
    ) -> Result<AnalysisArtifact> {
        let mut artifact = placeholder_artifact(repo, Timestamp::UNIX_EPOCH);
        artifact.flows[0].steps[1].step = 3;
        Ok(artifact)
    }
}

/// Polls the store until the job reaches a terminal phase.
pub(crate) async fn wait_for_terminal(store: &dyn StatusStore, id: &AnalysisId) -> AnalysisJob {
    for _ in 0..500 {
        if let Some(job) = store.get(id).await.unwrap() {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("analysis {id} did not finish");
}
