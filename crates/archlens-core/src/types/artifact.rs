//! Finished analysis artifacts: diagram markup plus animated flows.

use std::collections::HashSet;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::RepoIdentity;
use crate::Error;

/// One highlighted moment within a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    /// 1-based position of the step within its flow.
    pub step: u32,
    /// Label of the rendered diagram node this step highlights.
    pub node: String,
    /// Description of the action at this step.
    pub message: String,
    /// Autoplay dwell in milliseconds.
    pub duration: u64,
    /// Literal request detail shown verbatim, e.g. an HTTP request line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    /// Literal response detail shown verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl AnimationStep {
    /// Creates a step without request/response details.
    pub fn new(
        step: u32,
        node: impl Into<String>,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            step,
            node: node.into(),
            message: message.into(),
            duration: duration_ms,
            request: None,
            response: None,
        }
    }

    /// Attaches a literal request detail.
    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    /// Attaches a literal response detail.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Returns the authored autoplay dwell.
    #[inline]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration)
    }
}

/// A named, ordered walkthrough over the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Display name.
    pub name: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Steps in playback order.
    pub steps: Vec<AnimationStep>,
    /// Node labels referenced by the steps, for legend display.
    #[serde(default)]
    pub nodes: Vec<String>,
}

impl Flow {
    /// Creates a flow from its steps, deriving the legend from them.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<AnimationStep>,
    ) -> Self {
        let mut flow = Self {
            name: name.into(),
            description: description.into(),
            steps,
            nodes: Vec::new(),
        };

        flow.nodes = flow.referenced_nodes();
        flow
    }

    /// Returns the number of steps.
    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the step at a 1-based position.
    pub fn step(&self, position: usize) -> Option<&AnimationStep> {
        position.checked_sub(1).and_then(|index| self.steps.get(index))
    }

    /// Returns the distinct node labels referenced by the steps, in first-use order.
    pub fn referenced_nodes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.steps
            .iter()
            .filter(|step| seen.insert(step.node.as_str()))
            .map(|step| step.node.clone())
            .collect()
    }

    /// Fills the legend from the steps when the producer omitted it.
    pub fn ensure_nodes(&mut self) {
        if self.nodes.is_empty() {
            self.nodes = self.referenced_nodes();
        }
    }

    /// Checks that steps are numbered `1..=n` without gaps or duplicates and
    /// that every step names a node.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.name.trim().is_empty() {
            return Err(ArtifactError::EmptyFlowName);
        }

        for (index, step) in self.steps.iter().enumerate() {
            let expected = index as u64 + 1;
            if u64::from(step.step) != expected {
                return Err(ArtifactError::StepOutOfSequence {
                    flow: self.name.clone(),
                    expected,
                    found: step.step,
                });
            }
            if step.node.trim().is_empty() {
                return Err(ArtifactError::EmptyNodeLabel {
                    flow: self.name.clone(),
                    step: step.step,
                });
            }
        }

        Ok(())
    }
}

/// The finished diagram and flows bundle for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisArtifact {
    /// Flowchart markup describing the architecture graph.
    pub diagram: String,
    /// Walkthroughs in display order; the first one is selected by default.
    #[serde(default)]
    pub flows: Vec<Flow>,
    /// When the artifact was produced.
    pub timestamp: Timestamp,
    /// Repository the artifact describes.
    pub repo_identity: RepoIdentity,
}

impl AnalysisArtifact {
    /// Returns the default-selected flow.
    #[inline]
    pub fn default_flow(&self) -> Option<&Flow> {
        self.flows.first()
    }

    /// Validates every flow and that the diagram is present.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.diagram.trim().is_empty() {
            return Err(ArtifactError::EmptyDiagram);
        }

        self.flows.iter().try_for_each(Flow::validate)
    }
}

/// Structural defects of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// Diagram markup is missing.
    #[error("artifact has no diagram markup")]
    EmptyDiagram,

    /// A flow has no name.
    #[error("flow name must not be empty")]
    EmptyFlowName,

    /// A step number is not its position plus one.
    #[error("flow '{flow}': expected step {expected}, found step {found}")]
    StepOutOfSequence {
        flow: String,
        expected: u64,
        found: u32,
    },

    /// A step names no node.
    #[error("flow '{flow}': step {step} has an empty node label")]
    EmptyNodeLabel { flow: String, step: u32 },
}

impl From<ArtifactError> for Error {
    fn from(error: ArtifactError) -> Self {
        Error::invalid_input()
            .with_message(error.to_string())
            .with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(numbers: &[u32]) -> Vec<AnimationStep> {
        numbers
            .iter()
            .map(|&n| AnimationStep::new(n, format!("Node {n}"), "does work", 500))
            .collect()
    }

    fn artifact(flows: Vec<Flow>) -> AnalysisArtifact {
        AnalysisArtifact {
            diagram: "graph TD\n  A --> B".to_owned(),
            flows,
            timestamp: Timestamp::UNIX_EPOCH,
            repo_identity: RepoIdentity::new("acme", "widgets").unwrap(),
        }
    }

    #[test]
    fn contiguous_steps_validate() {
        let flow = Flow::new("Login", "", steps(&[1, 2, 3]));
        assert!(flow.validate().is_ok());
        assert_eq!(flow.step_count(), 3);
        assert_eq!(flow.step(1).unwrap().step, 1);
        assert!(flow.step(0).is_none());
        assert!(flow.step(4).is_none());
    }

    #[test]
    fn gap_is_detected() {
        let flow = Flow::new("Login", "", steps(&[1, 3]));
        assert_eq!(
            flow.validate(),
            Err(ArtifactError::StepOutOfSequence {
                flow: "Login".to_owned(),
                expected: 2,
                found: 3,
            })
        );
    }

    #[test]
    fn duplicate_is_detected() {
        let flow = Flow::new("Login", "", steps(&[1, 1, 2]));
        assert!(matches!(
            flow.validate(),
            Err(ArtifactError::StepOutOfSequence { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn empty_labels_are_rejected() {
        let mut flow = Flow::new("Login", "", steps(&[1]));
        flow.steps[0].node = "  ".to_owned();
        assert!(matches!(
            flow.validate(),
            Err(ArtifactError::EmptyNodeLabel { step: 1, .. })
        ));

        let unnamed = Flow::new(" ", "", steps(&[1]));
        assert_eq!(unnamed.validate(), Err(ArtifactError::EmptyFlowName));
    }

    #[test]
    fn referenced_nodes_are_distinct_and_ordered() {
        let flow = Flow::new(
            "Checkout",
            "",
            vec![
                AnimationStep::new(1, "Client", "click", 100),
                AnimationStep::new(2, "API", "validate", 100),
                AnimationStep::new(3, "Client", "render", 100),
            ],
        );
        assert_eq!(flow.nodes, vec!["Client", "API"]);
    }

    #[test]
    fn ensure_nodes_keeps_authored_legend() {
        let mut flow = Flow::new("Checkout", "", steps(&[1]));
        flow.nodes = vec!["Custom".to_owned()];
        flow.ensure_nodes();
        assert_eq!(flow.nodes, vec!["Custom"]);

        flow.nodes.clear();
        flow.ensure_nodes();
        assert_eq!(flow.nodes, vec!["Node 1"]);
    }

    #[test]
    fn artifact_validation_covers_diagram_and_flows() {
        assert!(artifact(Vec::new()).validate().is_ok());

        let mut empty = artifact(Vec::new());
        empty.diagram.clear();
        assert_eq!(empty.validate(), Err(ArtifactError::EmptyDiagram));

        let broken = artifact(vec![Flow::new("A", "", steps(&[2]))]);
        assert!(broken.validate().is_err());
    }

    #[test]
    fn serialized_shape() {
        let mut flow = Flow::new("Login", "User signs in", steps(&[1]));
        flow.steps[0] = flow.steps[0].clone().with_request("POST /login");
        let value = serde_json::to_value(artifact(vec![flow])).unwrap();

        assert_eq!(value["repoIdentity"]["owner"], "acme");
        assert_eq!(value["flows"][0]["steps"][0]["request"], "POST /login");
        assert!(value["flows"][0]["steps"][0].get("response").is_none());
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let json = r#"{
            "diagram": "graph TD",
            "timestamp": "2025-01-01T00:00:00Z",
            "repoIdentity": {"owner": "acme", "name": "widgets"}
        }"#;
        let parsed: AnalysisArtifact = serde_json::from_str(json).unwrap();
        assert!(parsed.flows.is_empty());
        assert!(parsed.default_flow().is_none());
    }
}
