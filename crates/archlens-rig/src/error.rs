//! Error types for archlens-rig.

use std::fmt;

use archlens_core::types::ArtifactError;

/// Result type alias for analyzer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while analyzing a repository with a model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provider error (API call failed, rate limited, etc.)
    #[error("provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The model answer did not contain the expected document.
    #[error("parse error: {0}")]
    Parse(String),

    /// The decoded document breaks artifact invariants.
    #[error("invalid artifact: {0}")]
    Invalid(#[from] ArtifactError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Creates a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Returns whether the model answered but the answer was unusable.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::Invalid(_) | Self::Serialization(_)
        )
    }
}

impl From<Error> for archlens_core::Error {
    fn from(error: Error) -> Self {
        let base = match &error {
            Error::Provider { .. } => archlens_core::Error::external_error(),
            Error::Config(_) => archlens_core::Error::service_unavailable(),
            Error::Parse(_) | Error::Invalid(_) | Error::Serialization(_) => {
                archlens_core::Error::serialization()
            }
        };

        base.with_message(error.to_string()).with_source(error)
    }
}
