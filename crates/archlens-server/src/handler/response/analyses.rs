//! Analysis response types.

use archlens_core::types::{AnalysisArtifact, AnalysisId};
use serde::{Deserialize, Serialize};

/// Answer to an analysis request.
///
/// Serialized untagged: either `{"analysisId": ..}` for a queued job or
/// `{"cached": true, "artifact": ..}` when the cache short-circuited.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisCreated {
    /// A job was queued; follow its event stream.
    Queued(QueuedAnalysis),
    /// The repository was already analyzed.
    Cached(CachedArtifact),
}

/// A queued analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAnalysis {
    /// Identifier of the job to stream.
    pub analysis_id: AnalysisId,
}

/// A finished artifact served from the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedArtifact {
    /// Always `true`.
    pub cached: bool,
    /// The cached artifact.
    pub artifact: AnalysisArtifact,
}

impl AnalysisCreated {
    /// Wraps a freshly queued job id.
    pub fn queued(analysis_id: AnalysisId) -> Self {
        Self::Queued(QueuedAnalysis { analysis_id })
    }

    /// Wraps a cached artifact.
    pub fn cached(artifact: AnalysisArtifact) -> Self {
        Self::Cached(CachedArtifact {
            cached: true,
            artifact,
        })
    }
}
