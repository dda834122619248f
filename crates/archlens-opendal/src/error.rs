//! Storage error types.

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// File or object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Stored document could not be decoded.
    #[error("corrupt document at '{path}': {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new corrupt document error.
    pub fn corrupt(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}

impl From<StorageError> for archlens_core::Error {
    fn from(error: StorageError) -> Self {
        let base = match &error {
            StorageError::NotFound(_) => archlens_core::Error::not_found(),
            StorageError::Corrupt { .. } => archlens_core::Error::serialization(),
            StorageError::Init(_) => archlens_core::Error::service_unavailable(),
            StorageError::PermissionDenied(_) | StorageError::Backend(_) => {
                archlens_core::Error::storage()
            }
        };

        base.with_message(error.to_string()).with_source(error)
    }
}
