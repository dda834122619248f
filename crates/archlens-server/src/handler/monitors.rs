//! Health check handler.

use std::sync::Arc;

use archlens_core::store::{ResultStore, StatusStore};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use jiff::Timestamp;

use super::response::{ComponentStatus, MonitorStatus};
use crate::extract::Json;
use crate::handler::Result;
use crate::pipeline::Orchestrator;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "archlens_server::handler::monitors";

/// Reports whether both stores are reachable.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(status_store): State<Arc<dyn StatusStore>>,
    State(result_store): State<Arc<dyn ResultStore>>,
    State(orchestrator): State<Orchestrator>,
) -> Result<(StatusCode, Json<MonitorStatus>)> {
    let (status_ping, result_ping) = tokio::join!(status_store.ping(), result_store.ping());

    if let Err(err) = &status_ping {
        tracing::warn!(target: TRACING_TARGET, error = %err, "Status store unreachable");
    }
    if let Err(err) = &result_ping {
        tracing::warn!(target: TRACING_TARGET, error = %err, "Result store unreachable");
    }

    let response = MonitorStatus {
        checked_at: Timestamp::now(),
        is_healthy: status_ping.is_ok() && result_ping.is_ok(),
        status_store: ComponentStatus::from_ping(&status_ping),
        result_store: ComponentStatus::from_ping(&result_ping),
        analyzer: orchestrator.analyzer_name().to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
    };

    let status_code = if response.is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy = response.is_healthy,
        status_code = status_code.as_u16(),
        "Health status response prepared"
    );

    Ok((status_code, Json(response)))
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test::create_test_harness;

    #[tokio::test]
    async fn healthy_with_memory_stores() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;

        let response = harness.server.get("/health").await;
        response.assert_status_ok();

        let status = response.json::<MonitorStatus>();
        assert!(status.is_healthy);
        assert_eq!(status.status_store, ComponentStatus::Healthy);
        assert_eq!(status.result_store, ComponentStatus::Healthy);
        assert_eq!(status.analyzer, "placeholder");

        Ok(())
    }
}
