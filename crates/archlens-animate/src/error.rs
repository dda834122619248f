use archlens_core::types::ArtifactError;

use crate::engine::{Command, PlaybackState};

/// Result type for engine commands.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors returned by engine commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The command is not accepted in the current state.
    #[error("cannot {command} while {state}")]
    InvalidTransition {
        command: Command,
        state: PlaybackState,
    },

    /// The flow index is out of range.
    #[error("flow {index} does not exist ({count} flows loaded)")]
    UnknownFlow { index: usize, count: usize },

    /// The selected flow has nothing to play.
    #[error("the selected flow has no steps")]
    EmptyFlow,

    /// A flow violates step numbering or naming rules.
    #[error("invalid flow: {0}")]
    InvalidFlow(#[from] ArtifactError),
}
