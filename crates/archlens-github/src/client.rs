//! GitHub tarball client.

use std::sync::Arc;

use archlens_core::source::{SourceArchive, SourceFetcher};
use archlens_core::types::RepoIdentity;
use bytes::{Bytes, BytesMut};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::archive::{ArchiveLimits, extract_archive};
use crate::config::GithubConfig;
use crate::{Error, Result, TRACING_TARGET_CLIENT};

/// REST API version requested on every call.
const API_VERSION: &str = "2022-11-28";

struct GithubClientInner {
    http: Client,
    config: GithubConfig,
}

/// Downloads repository tarballs from GitHub.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct GithubClient {
    inner: Arc<GithubClientInner>,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: GithubConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = config.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::InvalidConfig("token is not a valid header value".to_owned()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("archlens/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            api_url = %config.api_url,
            authenticated = config.token().is_some(),
            "GitHub client created"
        );

        Ok(Self {
            inner: Arc::new(GithubClientInner { http, config }),
        })
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &GithubConfig {
        &self.inner.config
    }

    /// Returns the tarball URL of a repository, at its branch hint if any.
    pub fn tarball_url(&self, repo: &RepoIdentity) -> String {
        let base = self.inner.config.api_url.trim_end_matches('/');
        match &repo.branch {
            Some(branch) => format!("{base}/repos/{}/{}/tarball/{branch}", repo.owner, repo.name),
            None => format!("{base}/repos/{}/{}/tarball", repo.owner, repo.name),
        }
    }

    /// Downloads the gzip tarball of a repository, enforcing the size cap.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT, fields(repo = %repo))]
    pub async fn download_tarball(&self, repo: &RepoIdentity) -> Result<Bytes> {
        let limit = self.inner.config.max_archive_bytes;
        let url = self.tarball_url(repo);

        let mut response = self.inner.http.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(Error::NotFound {
                    repo: repo.full_name(),
                });
            }
            status => {
                return Err(Error::Status {
                    repo: repo.full_name(),
                    status: status.as_u16(),
                });
            }
        }

        if response.content_length().is_some_and(|length| length > limit) {
            return Err(Error::TooLarge { limit });
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if buffer.len() as u64 + chunk.len() as u64 > limit {
                return Err(Error::TooLarge { limit });
            }
            buffer.extend_from_slice(&chunk);
        }

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            bytes = buffer.len(),
            "Repository archive downloaded"
        );

        Ok(buffer.freeze())
    }

    /// Unpacks a downloaded tarball on the blocking pool.
    pub async fn extract_tarball(&self, archive: Bytes) -> Result<SourceArchive> {
        let limits: ArchiveLimits = self.inner.config.limits();
        tokio::task::spawn_blocking(move || extract_archive(&archive, limits)).await?
    }
}

#[async_trait::async_trait]
impl SourceFetcher for GithubClient {
    async fn download(&self, repo: &RepoIdentity) -> archlens_core::Result<Bytes> {
        Ok(self.download_tarball(repo).await?)
    }

    async fn extract(&self, archive: Bytes) -> archlens_core::Result<SourceArchive> {
        Ok(self.extract_tarball(archive).await?)
    }
}
