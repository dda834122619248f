//! Producing artifacts from repository sources.

use jiff::Timestamp;

use crate::source::SourceArchive;
use crate::types::{AnalysisArtifact, AnimationStep, Flow, RepoIdentity};
use crate::{Result, TRACING_TARGET_ANALYZER};

/// Produces a diagram and its flows from repository sources.
///
/// Implementations must number steps contiguously from 1 and should use node
/// labels that prefix the labels rendered in the diagram.
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Analyzes the sources of a repository.
    async fn analyze(&self, repo: &RepoIdentity, source: &SourceArchive)
    -> Result<AnalysisArtifact>;
}

/// Dwell of each placeholder step in milliseconds.
const PLACEHOLDER_STEP_MS: u64 = 2000;

const PLACEHOLDER_DIAGRAM: &str = "\
graph TD
    Client[Client Browser] -->|HTTP request| Server[API Server]
    Server -->|Query| Database[(Database)]
    Database -->|Rows| Server
    Server -->|JSON response| Client
";

/// Builds the deterministic artifact used when no analysis model is available.
///
/// One flow with four steps over a client/server/database diagram.
pub fn placeholder_artifact(repo: &RepoIdentity, timestamp: Timestamp) -> AnalysisArtifact {
    let flow = Flow::new(
        "Request Lifecycle",
        "How a request travels from the browser to the database and back.",
        vec![
            AnimationStep::new(1, "Client", "The browser sends a request to the API.", PLACEHOLDER_STEP_MS)
                .with_request("GET /api/items"),
            AnimationStep::new(2, "API Server", "The API server queries the database.", PLACEHOLDER_STEP_MS)
                .with_request("SELECT * FROM items"),
            AnimationStep::new(3, "Database", "The database returns the matching rows.", PLACEHOLDER_STEP_MS)
                .with_response("42 rows"),
            AnimationStep::new(4, "API Server", "The API server responds with JSON.", PLACEHOLDER_STEP_MS)
                .with_response("200 OK"),
        ],
    );

    AnalysisArtifact {
        diagram: PLACEHOLDER_DIAGRAM.to_owned(),
        flows: vec![flow],
        timestamp,
        repo_identity: repo.clone(),
    }
}

/// Analyzer returning [`placeholder_artifact`] for every repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAnalyzer;

#[async_trait::async_trait]
impl Analyzer for PlaceholderAnalyzer {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn analyze(
        &self,
        repo: &RepoIdentity,
        source: &SourceArchive,
    ) -> Result<AnalysisArtifact> {
        tracing::debug!(
            target: TRACING_TARGET_ANALYZER,
            repo = %repo,
            files = source.files.len(),
            "Using placeholder analysis"
        );

        Ok(placeholder_artifact(repo, Timestamp::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::DiagramGraph;

    fn repo() -> RepoIdentity {
        RepoIdentity::new("acme", "widgets").unwrap()
    }

    #[test]
    fn placeholder_is_valid_and_deterministic() {
        let first = placeholder_artifact(&repo(), Timestamp::UNIX_EPOCH);
        let second = placeholder_artifact(&repo(), Timestamp::UNIX_EPOCH);

        assert_eq!(first, second);
        assert!(first.validate().is_ok());
        assert_eq!(first.flows.len(), 1);
        assert_eq!(first.flows[0].step_count(), 4);
    }

    #[test]
    fn placeholder_labels_match_its_diagram() {
        let artifact = placeholder_artifact(&repo(), Timestamp::UNIX_EPOCH);
        let graph = DiagramGraph::parse(&artifact.diagram);

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 4);
        assert!(graph.unmatched_labels(&artifact.flows[0]).is_empty());
    }

    #[tokio::test]
    async fn placeholder_analyzer_uses_repo() {
        let artifact = PlaceholderAnalyzer
            .analyze(&repo(), &SourceArchive::default())
            .await
            .unwrap();
        assert_eq!(artifact.repo_identity, repo());
        assert_eq!(PlaceholderAnalyzer.name(), "placeholder");
    }
}
