use std::sync::Arc;

use archlens_core::analyzer::Analyzer;
use archlens_core::source::SourceFetcher;
use archlens_core::store::{ResultStore, StatusStore};
use archlens_github::{GithubClient, GithubConfig};
use archlens_rig::AnalyzerConfig;
#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;

use crate::pipeline::PipelineConfig;
use crate::service::{StoreConfig, StreamConfig};
use crate::{Error, Result};

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Default, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Status and result store selection.
    #[builder(default)]
    #[cfg_attr(feature = "config", command(flatten))]
    pub store: StoreConfig,

    /// Repository download settings.
    #[builder(default)]
    #[cfg_attr(feature = "config", command(flatten))]
    pub github: GithubConfig,

    /// Analysis model settings.
    #[builder(default)]
    #[cfg_attr(feature = "config", command(flatten))]
    pub analyzer: AnalyzerConfig,

    /// Job concurrency.
    #[builder(default)]
    #[cfg_attr(feature = "config", command(flatten))]
    pub pipeline: PipelineConfig,

    /// Status stream settings.
    #[builder(default)]
    #[cfg_attr(feature = "config", command(flatten))]
    pub stream: StreamConfig,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Runs the builder checks on an already assembled configuration,
    /// e.g. one parsed from the command line.
    pub fn validate(&self) -> Result<()> {
        Self::builder()
            .with_store(self.store.clone())
            .with_github(self.github.clone())
            .with_analyzer(self.analyzer.clone())
            .with_pipeline(self.pipeline.clone())
            .with_stream(self.stream)
            .build()?;
        Ok(())
    }

    /// Opens the configured status store.
    pub async fn open_status_store(&self) -> Result<Arc<dyn StatusStore>> {
        self.store.open_status_store().await
    }

    /// Opens the configured result store.
    pub fn open_result_store(&self) -> Result<Arc<dyn ResultStore>> {
        self.store.open_result_store()
    }

    /// Creates the GitHub source fetcher.
    pub fn create_fetcher(&self) -> Result<Arc<dyn SourceFetcher>> {
        let client = GithubClient::new(self.github.clone())?;
        Ok(Arc::new(client))
    }

    /// Creates the analyzer, the placeholder when no provider is configured.
    pub fn create_analyzer(&self) -> Result<Arc<dyn Analyzer>> {
        archlens_rig::from_config(&self.analyzer).map_err(Into::into)
    }
}

impl ServiceConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &ServiceConfigBuilder) -> Result<(), String> {
        if let Some(store) = &builder.store {
            store.validate().map_err(|e| e.message().to_owned())?;
        }

        if let Some(github) = &builder.github {
            github.validate().map_err(|e| e.to_string())?;
        }

        if let Some(pipeline) = &builder.pipeline
            && pipeline.max_concurrent_jobs == 0
        {
            return Err("Max concurrent jobs must be greater than 0".to_string());
        }

        if let Some(stream) = &builder.stream
            && stream.stream_poll_interval_ms < 10
        {
            return Err("Stream poll interval must be at least 10 milliseconds".to_string());
        }

        Ok(())
    }
}

impl From<ServiceConfigBuilderError> for Error {
    fn from(err: ServiceConfigBuilderError) -> Self {
        Error::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::StatusBackend;

    #[test]
    fn builder_defaults() {
        let config = ServiceConfig::builder().build().unwrap();
        assert_eq!(config.store.status_backend, StatusBackend::Memory);
        assert_eq!(config.stream, StreamConfig::default());
    }

    #[test]
    fn builder_validation() {
        let result = ServiceConfig::builder()
            .with_pipeline(PipelineConfig::new().with_max_concurrent_jobs(0))
            .build();
        assert!(result.is_err());

        let result = ServiceConfig::builder()
            .with_stream(StreamConfig {
                stream_poll_interval_ms: 1,
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn validates_assembled_configs() {
        let mut config = ServiceConfig::default();
        assert!(config.validate().is_ok());

        config.pipeline.max_concurrent_jobs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn placeholder_analyzer_without_provider() {
        let config = ServiceConfig::default();
        let analyzer = config.create_analyzer().unwrap();
        assert_eq!(analyzer.name(), "placeholder");
    }
}
