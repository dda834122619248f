//! Job orchestration.

use std::sync::Arc;
use std::time::Duration;

use archlens_core::prelude::*;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::PipelineConfig;
use crate::TRACING_TARGET_PIPELINE;

/// Drives analysis jobs through their phases.
///
/// Cheap to clone; clones share the same workers and semaphore.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    status_store: Arc<dyn StatusStore>,
    result_store: Arc<dyn ResultStore>,
    fetcher: Arc<dyn SourceFetcher>,
    analyzer: Arc<dyn Analyzer>,
    semaphore: Arc<Semaphore>,
    cancel_token: CancellationToken,
    tracker: TaskTracker,
}

impl Orchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        config: &PipelineConfig,
        status_store: Arc<dyn StatusStore>,
        result_store: Arc<dyn ResultStore>,
        fetcher: Arc<dyn SourceFetcher>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            max_concurrent_jobs = config.max_concurrent_jobs,
            analyzer = analyzer.name(),
            "Starting job orchestrator"
        );

        Self {
            inner: Arc::new(OrchestratorInner {
                status_store,
                result_store,
                fetcher,
                analyzer,
                semaphore: config.create_semaphore(),
                cancel_token: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Stores the initial snapshot of `job` and runs it in the background.
    ///
    /// Fails without storing anything once shutdown began.
    pub async fn submit(&self, job: AnalysisJob) -> Result<AnalysisId> {
        if self.is_shutting_down() {
            return Err(Error::service_unavailable().with_message("server is shutting down"));
        }

        let id = job.id;
        self.inner.status_store.put(&job).await?;

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            analysis_id = %id,
            repo = %job.repo,
            "Analysis queued"
        );

        let inner = Arc::clone(&self.inner);
        self.inner.tracker.spawn(async move { inner.run(job).await });
        Ok(id)
    }

    /// Returns the name of the analyzer producing artifacts.
    pub fn analyzer_name(&self) -> &str {
        self.inner.analyzer.name()
    }

    /// Returns the number of jobs queued or running.
    pub fn active_jobs(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Returns whether [`Orchestrator::shutdown`] was called.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.cancel_token.is_cancelled()
    }

    /// Stops accepting jobs and fails the ones still waiting for a permit.
    ///
    /// Running jobs continue; await them with [`Orchestrator::drain`].
    pub fn shutdown(&self) {
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            active_jobs = self.active_jobs(),
            "Shutting down job orchestrator"
        );

        self.inner.cancel_token.cancel();
        self.inner.tracker.close();
    }

    /// Waits up to `timeout` for every job to finish.
    ///
    /// Returns `false` when jobs were still running at the deadline.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.inner.tracker.close();
        let drained = tokio::time::timeout(timeout, self.inner.tracker.wait())
            .await
            .is_ok();

        if drained {
            tracing::info!(target: TRACING_TARGET_PIPELINE, "All analyses finished");
        } else {
            tracing::warn!(
                target: TRACING_TARGET_PIPELINE,
                active_jobs = self.active_jobs(),
                timeout_secs = timeout.as_secs(),
                "Analyses still running at shutdown deadline"
            );
        }

        drained
    }
}

impl OrchestratorInner {
    async fn run(&self, mut job: AnalysisJob) {
        let permit = tokio::select! {
            biased;

            () = self.cancel_token.cancelled() => {
                self.fail(&mut job, "Server shut down before the analysis started").await;
                return;
            }

            permit = Arc::clone(&self.semaphore).acquire_owned() => permit,
        };

        let Ok(_permit) = permit else {
            self.fail(&mut job, "Job orchestrator stopped").await;
            return;
        };

        match self.execute(&mut job).await {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET_PIPELINE,
                    analysis_id = %job.id,
                    repo = %job.repo,
                    "Analysis complete"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_PIPELINE,
                    analysis_id = %job.id,
                    repo = %job.repo,
                    phase = %job.status.phase,
                    error = %err,
                    "Analysis failed"
                );
                self.fail(&mut job, err.message_or_kind()).await;
            }
        }
    }

    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_PIPELINE,
        fields(analysis_id = %job.id, repo = %job.repo)
    )]
    async fn execute(&self, job: &mut AnalysisJob) -> Result<()> {
        let downloading = format!("Downloading {}", job.repo.full_name());
        self.advance(job, Phase::Downloading, 10, downloading).await?;
        let archive = self.fetcher.download(&job.repo).await?;

        let extracting = format!("Extracting {} KiB archive", archive.len().div_ceil(1024));
        self.advance(job, Phase::Extracting, 30, extracting).await?;
        let source = self.fetcher.extract(archive).await?;
        if source.is_empty() {
            return Err(Error::invalid_input()
                .with_message("repository contains no readable source files"));
        }

        let analyzing = format!("Analyzing {} source files", source.files.len());
        self.advance(job, Phase::Analyzing, 50, analyzing).await?;
        let artifact = self.analyzer.analyze(&job.repo, &source).await?;
        artifact.validate()?;

        self.advance(job, Phase::Generating, 80, "Generating animation").await?;
        let location = self.result_store.put(&artifact).await?;

        job.complete(artifact, location.uri)?;
        self.status_store.put(job).await
    }

    async fn advance(
        &self,
        job: &mut AnalysisJob,
        phase: Phase,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<()> {
        job.advance(phase, progress, message)?;
        self.status_store.put(job).await?;

        tracing::debug!(
            target: TRACING_TARGET_PIPELINE,
            analysis_id = %job.id,
            phase = %phase,
            progress = job.status.progress,
            "Analysis progressed"
        );

        Ok(())
    }

    /// Writes the terminal `error` status.
    async fn fail(&self, job: &mut AnalysisJob, message: &str) {
        if let Err(err) = job.fail(message) {
            tracing::error!(
                target: TRACING_TARGET_PIPELINE,
                analysis_id = %job.id,
                error = %err,
                "Cannot mark finished analysis as failed"
            );
            return;
        }

        if let Err(err) = self.status_store.put(job).await {
            tracing::error!(
                target: TRACING_TARGET_PIPELINE,
                analysis_id = %job.id,
                error = %err,
                "Failed to store analysis failure"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Notify;

    use super::*;
    use crate::pipeline::testing::{
        FailingAnalyzer, GappedAnalyzer, RecordingStatusStore, StaticFetcher, wait_for_terminal,
    };

    struct Harness {
        status_store: Arc<MemoryStatusStore>,
        result_store: Arc<MemoryResultStore>,
        orchestrator: Orchestrator,
    }

    fn harness(fetcher: StaticFetcher, max_concurrent_jobs: usize) -> Harness {
        let status_store = Arc::new(MemoryStatusStore::new(Duration::from_secs(3600)));
        let result_store = Arc::new(MemoryResultStore::new());
        let config = PipelineConfig::new().with_max_concurrent_jobs(max_concurrent_jobs);
        let orchestrator = Orchestrator::new(
            &config,
            status_store.clone(),
            result_store.clone(),
            Arc::new(fetcher),
            Arc::new(PlaceholderAnalyzer),
        );

        Harness {
            status_store,
            result_store,
            orchestrator,
        }
    }

    fn recording(analyzer: impl Analyzer) -> (Arc<RecordingStatusStore>, Orchestrator) {
        let status_store = Arc::new(RecordingStatusStore::new());
        let orchestrator = Orchestrator::new(
            &PipelineConfig::new(),
            status_store.clone(),
            Arc::new(MemoryResultStore::new()),
            Arc::new(StaticFetcher::new()),
            Arc::new(analyzer),
        );

        (status_store, orchestrator)
    }

    fn job(name: &str) -> AnalysisJob {
        AnalysisJob::new(RepoIdentity::new("acme", name).unwrap())
    }

    #[tokio::test]
    async fn completes_and_caches_artifact() {
        let harness = harness(StaticFetcher::new(), 2);
        let id = harness.orchestrator.submit(job("widgets")).await.unwrap();

        let finished = wait_for_terminal(harness.status_store.as_ref(), &id).await;
        assert_eq!(finished.status.phase, Phase::Complete);
        assert_eq!(finished.status.progress, 100);
        assert_eq!(finished.result_location.as_deref(), Some("memory://acme/widgets"));

        let repo = RepoIdentity::new("acme", "widgets").unwrap();
        let cached = harness.result_store.get(&repo).await.unwrap();
        assert_eq!(cached, finished.result);
    }

    #[tokio::test]
    async fn writes_every_phase_in_order() {
        let (status_store, orchestrator) = recording(PlaceholderAnalyzer);
        let id = orchestrator.submit(job("widgets")).await.unwrap();
        wait_for_terminal(status_store.as_ref(), &id).await;

        assert_eq!(
            status_store.writes(),
            vec![
                (Phase::Downloading, 0),
                (Phase::Downloading, 10),
                (Phase::Extracting, 30),
                (Phase::Analyzing, 50),
                (Phase::Generating, 80),
                (Phase::Complete, 100),
            ]
        );
    }

    #[tokio::test]
    async fn analyzer_failures_become_error_status() {
        let (status_store, orchestrator) = recording(FailingAnalyzer("model overloaded"));
        let id = orchestrator.submit(job("widgets")).await.unwrap();

        let finished = wait_for_terminal(status_store.as_ref(), &id).await;
        assert_eq!(finished.status.phase, Phase::Error);
        assert_eq!(finished.status.progress, 50);
        assert_eq!(finished.status.error.as_deref(), Some("model overloaded"));
        assert!(finished.result.is_none());
        assert_eq!(status_store.writes().last(), Some(&(Phase::Error, 50)));
    }

    #[tokio::test]
    async fn invalid_artifacts_are_not_cached() {
        let status_store = Arc::new(RecordingStatusStore::new());
        let result_store = Arc::new(MemoryResultStore::new());
        let orchestrator = Orchestrator::new(
            &PipelineConfig::new(),
            status_store.clone(),
            result_store.clone(),
            Arc::new(StaticFetcher::new()),
            Arc::new(GappedAnalyzer),
        );
        let id = orchestrator.submit(job("widgets")).await.unwrap();

        let finished = wait_for_terminal(status_store.as_ref(), &id).await;
        assert_eq!(finished.status.phase, Phase::Error);
        let message = finished.status.error.unwrap();
        assert!(message.contains("expected step 2, found step 3"), "{message}");

        let repo = RepoIdentity::new("acme", "widgets").unwrap();
        assert!(result_store.get(&repo).await.unwrap().is_none());
        assert!(!status_store.writes().contains(&(Phase::Generating, 80)));
    }

    #[tokio::test]
    async fn download_failures_become_error_status() {
        let harness = harness(StaticFetcher::failing("connection reset"), 2);
        let id = harness.orchestrator.submit(job("widgets")).await.unwrap();

        let finished = wait_for_terminal(harness.status_store.as_ref(), &id).await;
        assert_eq!(finished.status.phase, Phase::Error);
        assert_eq!(finished.status.progress, 10);
        assert_eq!(finished.status.error.as_deref(), Some("connection reset"));
        assert!(finished.result.is_none());
    }

    #[tokio::test]
    async fn empty_sources_fail_the_job() {
        let harness = harness(StaticFetcher::empty(), 2);
        let id = harness.orchestrator.submit(job("widgets")).await.unwrap();

        let finished = wait_for_terminal(harness.status_store.as_ref(), &id).await;
        assert_eq!(finished.status.phase, Phase::Error);
        assert_eq!(
            finished.status.error.as_deref(),
            Some("repository contains no readable source files")
        );
    }

    #[tokio::test]
    async fn shutdown_fails_queued_jobs_and_drains_running_ones() {
        let gate = Arc::new(Notify::new());
        let harness = harness(StaticFetcher::gated(gate.clone()), 1);

        let running = harness.orchestrator.submit(job("widgets")).await.unwrap();
        // Let the first job take the only permit.
        for _ in 0..100 {
            let job = harness.status_store.get(&running).await.unwrap().unwrap();
            if job.status.progress == 10 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let queued = harness.orchestrator.submit(job("gadgets")).await.unwrap();
        harness.orchestrator.shutdown();

        let rejected = harness.orchestrator.submit(job("gizmos")).await.unwrap_err();
        assert_eq!(rejected.kind, ErrorKind::ServiceUnavailable);

        let failed = wait_for_terminal(harness.status_store.as_ref(), &queued).await;
        assert_eq!(failed.status.phase, Phase::Error);

        gate.notify_one();
        assert!(harness.orchestrator.drain(Duration::from_secs(5)).await);

        let finished = harness.status_store.get(&running).await.unwrap().unwrap();
        assert_eq!(finished.status.phase, Phase::Complete);
        assert_eq!(harness.orchestrator.active_jobs(), 0);
    }
}
