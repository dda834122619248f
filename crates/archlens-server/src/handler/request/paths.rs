//! Path parameter types for HTTP handlers.

use archlens_core::types::AnalysisId;
use serde::{Deserialize, Serialize};

/// Path parameters of analysis job operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPathParams {
    /// Identifier of the analysis job.
    pub analysis_id: AnalysisId,
}

/// Path parameters naming a repository.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
pub struct RepoPathParams {
    /// Account or organization login.
    pub owner: String,
    /// Repository name.
    pub name: String,
}
