//! Configuration for the GitHub client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::archive::ArchiveLimits;
use crate::{Error, Result};

/// Public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Configuration of repository downloads and extraction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct GithubConfig {
    /// Token for private repositories and higher rate limits
    #[cfg_attr(feature = "config", arg(long = "github-token", env = "GITHUB_TOKEN"))]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[cfg_attr(
        feature = "config",
        arg(long = "github-api-url", env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)
    )]
    pub api_url: String,

    /// Largest compressed archive accepted, in bytes
    #[cfg_attr(
        feature = "config",
        arg(
            long = "github-max-archive-bytes",
            env = "GITHUB_MAX_ARCHIVE_BYTES",
            default_value_t = 100 * 1024 * 1024
        )
    )]
    pub max_archive_bytes: u64,

    /// Download timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "github-timeout-secs", env = "GITHUB_TIMEOUT_SECS", default_value_t = 60)
    )]
    pub timeout_secs: u64,

    /// Largest single file kept after extraction, in bytes
    #[cfg_attr(
        feature = "config",
        arg(long = "source-max-file-bytes", env = "ARCHLENS_SOURCE_MAX_FILE_BYTES", default_value_t = 256 * 1024)
    )]
    pub max_file_bytes: u64,

    /// Total bytes of file contents kept after extraction
    #[cfg_attr(
        feature = "config",
        arg(long = "source-max-total-bytes", env = "ARCHLENS_SOURCE_MAX_TOTAL_BYTES", default_value_t = 16 * 1024 * 1024)
    )]
    pub max_total_bytes: u64,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("max_archive_bytes", &self.max_archive_bytes)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("max_total_bytes", &self.max_total_bytes)
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        let limits = ArchiveLimits::default();
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_owned(),
            max_archive_bytes: 100 * 1024 * 1024,
            timeout_secs: 60,
            max_file_bytes: limits.max_file_bytes,
            max_total_bytes: limits.max_total_bytes,
        }
    }
}

impl GithubConfig {
    /// Sets the API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Returns the download timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the extraction limits.
    pub fn limits(&self) -> ArchiveLimits {
        ArchiveLimits {
            max_file_bytes: self.max_file_bytes,
            max_total_bytes: self.max_total_bytes,
        }
    }

    /// Returns the token when one is set and not blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("https://") || self.api_url.starts_with("http://")) {
            return Err(Error::InvalidConfig(format!(
                "API URL must be http(s), got {}",
                self.api_url
            )));
        }
        if self.max_archive_bytes == 0 || self.max_file_bytes == 0 || self.max_total_bytes == 0 {
            return Err(Error::InvalidConfig("size limits must be positive".to_owned()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig("timeout must be positive".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GithubConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits(), ArchiveLimits::default());
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.token(), None);
    }

    #[test]
    fn rejects_bad_values() {
        let config = GithubConfig::default().with_api_url("ftp://example.com");
        assert!(config.validate().is_err());

        let config = GithubConfig {
            max_file_bytes: 0,
            ..GithubConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_hides_the_token() {
        let config = GithubConfig::default().with_token("ghp_secret");
        assert!(!format!("{config:?}").contains("ghp_secret"));
        assert_eq!(config.token(), Some("ghp_secret"));
    }
}
