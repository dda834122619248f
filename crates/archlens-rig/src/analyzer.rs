//! Model-backed [`Analyzer`] implementation.

use std::sync::Arc;

use archlens_core::analyzer::{Analyzer, PlaceholderAnalyzer};
use archlens_core::diagram::DiagramGraph;
use archlens_core::source::SourceArchive;
use archlens_core::types::{AnalysisArtifact, RepoIdentity};
use jiff::Timestamp;

use crate::config::AnalyzerConfig;
use crate::prompt::{PREAMBLE, SourceDigest};
use crate::provider::CompletionProvider;
use crate::response::parse_artifact;
use crate::{Result, TRACING_TARGET};

/// Analyzer asking a completion model for the diagram and flows.
#[derive(Debug, Clone)]
pub struct RigAnalyzer {
    provider: CompletionProvider,
    source_budget: usize,
    max_tokens: u64,
}

impl RigAnalyzer {
    /// Creates an analyzer over a completion provider.
    pub fn new(provider: CompletionProvider, config: &AnalyzerConfig) -> Self {
        Self {
            provider,
            source_budget: config.source_budget,
            max_tokens: config.max_tokens,
        }
    }

    /// Returns the completion provider.
    #[inline]
    pub fn provider(&self) -> &CompletionProvider {
        &self.provider
    }
}

#[async_trait::async_trait]
impl Analyzer for RigAnalyzer {
    fn name(&self) -> &str {
        self.provider.provider_name()
    }

    #[tracing::instrument(skip(self, source), target = TRACING_TARGET, fields(repo = %repo))]
    async fn analyze(
        &self,
        repo: &RepoIdentity,
        source: &SourceArchive,
    ) -> archlens_core::Result<AnalysisArtifact> {
        let digest = SourceDigest::build(repo, source, self.source_budget);
        tracing::debug!(
            target: TRACING_TARGET,
            included = digest.included,
            omitted = digest.omitted,
            prompt_bytes = digest.text.len(),
            "Built source digest"
        );

        let answer = self
            .provider
            .complete(PREAMBLE, &digest.text, self.max_tokens)
            .await?;

        let artifact = parse_artifact(&answer, repo, Timestamp::now()).inspect_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                answer_bytes = answer.len(),
                "Model answer rejected"
            );
        })?;

        let graph = DiagramGraph::parse(&artifact.diagram);
        for flow in &artifact.flows {
            let unmatched = graph.unmatched_labels(flow);
            if !unmatched.is_empty() {
                tracing::warn!(
                    target: TRACING_TARGET,
                    flow = %flow.name,
                    labels = ?unmatched,
                    "Step labels match no diagram node"
                );
            }
        }

        tracing::info!(
            target: TRACING_TARGET,
            model = self.provider.model_name(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            flows = artifact.flows.len(),
            "Analysis produced"
        );

        Ok(artifact)
    }
}

/// Builds the analyzer selected by the configuration.
///
/// Falls back to [`PlaceholderAnalyzer`] when no provider is selected or the
/// API key is missing.
pub fn from_config(config: &AnalyzerConfig) -> Result<Arc<dyn Analyzer>> {
    match CompletionProvider::from_config(config)? {
        Some(provider) => {
            tracing::info!(
                target: TRACING_TARGET,
                provider = provider.provider_name(),
                model = provider.model_name(),
                "Using model analyzer"
            );
            Ok(Arc::new(RigAnalyzer::new(provider, config)))
        }
        None => {
            tracing::warn!(
                target: TRACING_TARGET,
                provider = %config.provider,
                "No analysis model available, using placeholder artifacts"
            );
            Ok(Arc::new(PlaceholderAnalyzer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_placeholder() {
        let analyzer = from_config(&AnalyzerConfig::default()).unwrap();
        assert_eq!(analyzer.name(), "placeholder");

        let mut config = AnalyzerConfig::openai("");
        config.api_key = None;
        assert_eq!(from_config(&config).unwrap().name(), "placeholder");
    }

    #[test]
    fn selects_model_analyzer() {
        let analyzer = from_config(&AnalyzerConfig::anthropic("sk-test")).unwrap();
        assert_eq!(analyzer.name(), "anthropic");
    }
}
