//! Storage configuration types.

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// Kind of blob backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendType {
    /// Process-local memory.
    #[default]
    Memory,
    /// Local filesystem directory.
    Fs,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StorageConfig {
    /// Result store backend
    #[cfg_attr(
        feature = "config",
        arg(
            long = "result-backend",
            env = "ARCHLENS_RESULT_BACKEND",
            value_enum,
            default_value_t = BackendType::Memory
        )
    )]
    pub backend_type: BackendType,

    /// Root directory of the filesystem backend
    #[cfg_attr(
        feature = "config",
        arg(
            long = "result-root",
            env = "ARCHLENS_RESULT_ROOT",
            default_value = "./data/artifacts"
        )
    )]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::memory()
    }
}

impl StorageConfig {
    /// Process-local memory backend.
    pub fn memory() -> Self {
        Self {
            backend_type: BackendType::Memory,
            root: "/".to_owned(),
        }
    }

    /// Filesystem backend rooted at `root`.
    pub fn fs(root: impl Into<String>) -> Self {
        Self {
            backend_type: BackendType::Fs,
            root: root.into(),
        }
    }
}
