//! Internal error types for archlens-github.

use thiserror::Error;

/// Result type alias for archlens-github operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while fetching or unpacking repository sources.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// The repository or branch does not exist or is not visible.
    #[error("repository {repo} not found")]
    NotFound { repo: String },

    /// GitHub answered with an unexpected status.
    #[error("GitHub responded with {status} for {repo}")]
    Status { repo: String, status: u16 },

    /// The download exceeded the configured size cap.
    #[error("archive exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    /// The archive could not be decompressed or read.
    #[error("unreadable archive: {0}")]
    Archive(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The extraction task was aborted.
    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<Error> for archlens_core::Error {
    fn from(err: Error) -> Self {
        let base = match &err {
            Error::Reqwest(e) if e.is_timeout() => archlens_core::Error::timeout(),
            Error::Reqwest(_) => archlens_core::Error::network_error(),
            Error::NotFound { .. } => archlens_core::Error::not_found(),
            Error::Status { .. } => archlens_core::Error::external_error(),
            Error::TooLarge { .. } | Error::InvalidConfig(_) => {
                archlens_core::Error::invalid_input()
            }
            Error::Archive(_) => archlens_core::Error::serialization(),
            Error::Join(_) => archlens_core::Error::internal_error(),
        };

        base.with_message(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use archlens_core::ErrorKind;

    use super::*;

    #[test]
    fn maps_to_core_kinds() {
        let error: archlens_core::Error = Error::NotFound {
            repo: "acme/widgets".to_owned(),
        }
        .into();
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert!(error.to_string().contains("acme/widgets"));

        let error: archlens_core::Error = Error::TooLarge { limit: 10 }.into();
        assert_eq!(error.kind, ErrorKind::InvalidInput);

        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad gzip header");
        let error: archlens_core::Error = Error::Archive(io).into();
        assert_eq!(error.kind, ErrorKind::Serialization);
    }
}
