//! Transient analysis jobs and their progress status.

use std::fmt;
use std::str::FromStr;

use derive_more::{Deref, From, Into};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnalysisArtifact, Phase, RepoIdentity};
use crate::{Error, Result};

/// Unique identifier of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Deref, From, Into)]
#[serde(transparent)]
pub struct AnalysisId(Uuid);

impl AnalysisId {
    /// Generates a fresh, time-ordered identifier.
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AnalysisId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|e| {
            Error::invalid_input()
                .with_message(format!("invalid analysis id: {s}"))
                .with_source(e)
        })
    }
}

/// Progress snapshot of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Percentage in `0..=100`.
    pub progress: u8,
    /// Human-readable description of the current work.
    pub message: String,
    /// Failure message, present in the `error` phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatus {
    /// Creates a non-failed status; progress is capped at 100.
    pub fn new(phase: Phase, progress: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            progress: progress.min(100),
            message: message.into(),
            error: None,
        }
    }
}

/// A job analyzing one repository.
///
/// Jobs are written only by the orchestrator that created them; every other
/// component observes snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    /// Job identifier.
    pub id: AnalysisId,
    /// Repository being analyzed.
    pub repo: RepoIdentity,
    /// Latest status.
    pub status: JobStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the latest status change.
    pub updated_at: Timestamp,
    /// Finished artifact, present once complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisArtifact>,
    /// Location of the cached artifact in the result store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_location: Option<String>,
}

impl AnalysisJob {
    /// Creates a job in the `downloading` phase at 0%.
    pub fn new(repo: RepoIdentity) -> Self {
        let now = Timestamp::now();
        Self {
            id: AnalysisId::new_v7(),
            repo,
            status: JobStatus::new(Phase::Downloading, 0, "Queued for analysis"),
            created_at: now,
            updated_at: now,
            result: None,
            result_location: None,
        }
    }

    /// Returns whether the job reached `complete` or `error`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.phase.is_terminal()
    }

    /// Moves to a non-terminal phase.
    ///
    /// Progress never decreases: a lower value keeps the current percentage.
    pub fn advance(&mut self, phase: Phase, progress: u8, message: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        let progress = progress.max(self.status.progress);
        self.status = JobStatus::new(phase, progress, message);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Marks the job complete with its artifact attached.
    pub fn complete(
        &mut self,
        artifact: AnalysisArtifact,
        location: impl Into<String>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.status = JobStatus::new(Phase::Complete, 100, "Analysis complete");
        self.result = Some(artifact);
        self.result_location = Some(location.into());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Marks the job failed, keeping the progress it had reached.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        let error = error.into();
        self.status = JobStatus {
            phase: Phase::Error,
            progress: self.status.progress,
            message: "Analysis failed".to_owned(),
            error: Some(error),
        };
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(Error::internal_error().with_message(format!(
                "analysis {} already finished in phase {}",
                self.id, self.status.phase
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> AnalysisJob {
        AnalysisJob::new(RepoIdentity::new("acme", "widgets").unwrap())
    }

    fn artifact() -> AnalysisArtifact {
        AnalysisArtifact {
            diagram: "graph TD".to_owned(),
            flows: Vec::new(),
            timestamp: Timestamp::UNIX_EPOCH,
            repo_identity: RepoIdentity::new("acme", "widgets").unwrap(),
        }
    }

    #[test]
    fn new_job_starts_downloading_at_zero() {
        let job = job();
        assert_eq!(job.status.phase, Phase::Downloading);
        assert_eq!(job.status.progress, 0);
        assert!(!job.is_terminal());
        assert!(job.result.is_none());
    }

    #[test]
    fn progress_is_monotonic() {
        let mut job = job();
        job.advance(Phase::Extracting, 30, "extracting").unwrap();
        job.advance(Phase::Analyzing, 20, "analyzing").unwrap();
        assert_eq!(job.status.phase, Phase::Analyzing);
        assert_eq!(job.status.progress, 30);
    }

    #[test]
    fn completion_attaches_artifact() {
        let mut job = job();
        job.complete(artifact(), "memory://acme/widgets").unwrap();
        assert_eq!(job.status.phase, Phase::Complete);
        assert_eq!(job.status.progress, 100);
        assert!(job.result.is_some());
        assert_eq!(job.result_location.as_deref(), Some("memory://acme/widgets"));
    }

    #[test]
    fn failure_keeps_progress_and_is_final() {
        let mut job = job();
        job.advance(Phase::Analyzing, 50, "analyzing").unwrap();
        job.fail("model unavailable").unwrap();

        assert_eq!(job.status.phase, Phase::Error);
        assert_eq!(job.status.progress, 50);
        assert_eq!(job.status.error.as_deref(), Some("model unavailable"));
        assert!(job.advance(Phase::Generating, 80, "late").is_err());
        assert!(job.fail("again").is_err());
    }

    #[test]
    fn analysis_id_parses() {
        let id = AnalysisId::new_v7();
        assert_eq!(id.to_string().parse::<AnalysisId>().unwrap(), id);
        assert!("not-a-uuid".parse::<AnalysisId>().is_err());
    }

    #[test]
    fn status_wire_shape() {
        let status = JobStatus::new(Phase::Generating, 80, "Generating diagram");
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"phase": "generating", "progress": 80, "message": "Generating diagram"})
        );
    }
}
