//! Application state and dependency injection.

use std::sync::Arc;

use archlens_core::analyzer::Analyzer;
use archlens_core::source::SourceFetcher;
use archlens_core::store::{ResultStore, StatusStore};

use crate::pipeline::Orchestrator;
use crate::service::{ServiceConfig, StreamConfig};
use crate::{Result, TRACING_TARGET_SERVICE};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection). Stores are
/// selected once at startup and shared as trait objects.
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    status_store: Arc<dyn StatusStore>,
    result_store: Arc<dyn ResultStore>,
    orchestrator: Orchestrator,
    stream_config: StreamConfig,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to the configured stores and starts the orchestrator.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let status_store = config.open_status_store().await?;
        let result_store = config.open_result_store()?;
        let fetcher = config.create_fetcher()?;
        let analyzer = config.create_analyzer()?;

        let state = Self::from_parts(config, status_store, result_store, fetcher, analyzer);

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            analyzer = state.orchestrator.analyzer_name(),
            "Service state initialized"
        );

        Ok(state)
    }

    /// Assembles the state from already constructed collaborators.
    pub fn from_parts(
        config: &ServiceConfig,
        status_store: Arc<dyn StatusStore>,
        result_store: Arc<dyn ResultStore>,
        fetcher: Arc<dyn SourceFetcher>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            &config.pipeline,
            Arc::clone(&status_store),
            Arc::clone(&result_store),
            fetcher,
            analyzer,
        );

        Self {
            status_store,
            result_store,
            orchestrator,
            stream_config: config.stream,
        }
    }

    /// Returns the job orchestrator, e.g. to drain it on shutdown.
    #[inline]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(status_store: Arc<dyn StatusStore>);
impl_di!(result_store: Arc<dyn ResultStore>);
impl_di!(orchestrator: Orchestrator);
impl_di!(stream_config: StreamConfig);
