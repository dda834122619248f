//! Storage backend implementation.

use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::{BackendType, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// Storage backend wrapping an OpenDAL operator.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.backend_type,
            root = %config.root,
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Reads a file, `None` when it does not exist.
    pub async fn read(&self, path: &str) -> StorageResult<Option<Vec<u8>>> {
        tracing::debug!(target: TRACING_TARGET, path = %path, "Reading file");

        match self.operator.read(path).await {
            Ok(buffer) => {
                let data = buffer.to_vec();
                tracing::debug!(
                    target: TRACING_TARGET,
                    path = %path,
                    size = data.len(),
                    "File read complete"
                );
                Ok(Some(data))
            }
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes data to a file, replacing any previous content.
    pub async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Writing file"
        );

        self.operator.write(path, data).await?;
        Ok(())
    }

    /// Deletes a file; deleting a missing file succeeds.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        tracing::debug!(target: TRACING_TARGET, path = %path, "Deleting file");
        self.operator.delete(path).await?;
        Ok(())
    }

    /// Checks if a file exists.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.operator.exists(path).await?)
    }

    /// Checks that the backend answers.
    pub async fn check(&self) -> StorageResult<()> {
        self.operator.check().await?;
        Ok(())
    }

    /// Returns a URI naming `path` in this backend.
    pub fn uri(&self, path: &str) -> String {
        match self.config.backend_type {
            BackendType::Memory => format!("memory://{path}"),
            BackendType::Fs => {
                format!("file://{}/{path}", self.config.root.trim_end_matches('/'))
            }
        }
    }

    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config.backend_type {
            BackendType::Memory => {
                let builder = services::Memory::default().root(&config.root);
                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }
            BackendType::Fs => {
                let builder = services::Fs::default().root(&config.root);
                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("backend_type", &self.config.backend_type)
            .field("root", &self.config.root)
            .finish()
    }
}
