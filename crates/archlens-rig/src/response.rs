//! Decoding model answers into artifacts.

use archlens_core::types::{AnalysisArtifact, Flow, RepoIdentity};
use jiff::Timestamp;
use serde::Deserialize;

use crate::{Error, Result, TRACING_TARGET};

/// Number of flows a well-formed answer carries.
const EXPECTED_FLOWS: std::ops::RangeInclusive<usize> = 2..=4;

/// The part of an artifact a model produces.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisDraft {
    diagram: String,
    #[serde(default)]
    flows: Vec<Flow>,
}

/// Returns the JSON object embedded in a model answer.
///
/// Prefers the body of a fenced code block and falls back to the span from
/// the first `{` to the last `}`.
pub fn extract_json(answer: &str) -> Option<&str> {
    if let Some(body) = fenced_block(answer) {
        let body = body.trim();
        if body.starts_with('{') {
            return Some(body);
        }
    }

    let start = answer.find('{')?;
    let end = answer.rfind('}')?;
    (start < end).then(|| &answer[start..=end])
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip the info string (`json`, `JSON`, ...).
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let close = body.find("\n```")?;
    Some(&body[..close])
}

/// Removes a surrounding ```` ```mermaid ```` fence from diagram markup.
fn strip_diagram_fence(diagram: &str) -> String {
    let trimmed = diagram.trim();
    match fenced_block(trimmed) {
        Some(body) if trimmed.starts_with("```") => body.trim().to_owned(),
        _ => trimmed.to_owned(),
    }
}

/// Decodes and validates a model answer.
///
/// Answers that do not decode, carry no flow, or break step numbering are
/// rejected. Flows without a legend get one derived from their steps.
pub fn parse_artifact(
    answer: &str,
    repo: &RepoIdentity,
    timestamp: Timestamp,
) -> Result<AnalysisArtifact> {
    let json = extract_json(answer).ok_or_else(|| Error::parse("answer holds no JSON object"))?;
    let draft: AnalysisDraft = serde_json::from_str(json)?;

    if draft.flows.is_empty() {
        return Err(Error::parse("answer holds no flows"));
    }
    if !EXPECTED_FLOWS.contains(&draft.flows.len()) {
        tracing::warn!(
            target: TRACING_TARGET,
            repo = %repo,
            flows = draft.flows.len(),
            "Unexpected number of flows"
        );
    }

    let mut flows = draft.flows;
    flows.iter_mut().for_each(Flow::ensure_nodes);

    let artifact = AnalysisArtifact {
        diagram: strip_diagram_fence(&draft.diagram),
        flows,
        timestamp,
        repo_identity: repo.clone(),
    };

    artifact.validate()?;
    Ok(artifact)
}
