//! Analysis job creation and lookup handlers.

use std::sync::Arc;

use archlens_core::store::{ResultStore, StatusStore};
use archlens_core::types::AnalysisJob;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};

use super::request::{AnalysisPathParams, CreateAnalysis};
use super::response::AnalysisCreated;
use crate::extract::{Json, Path, ValidateJson};
use crate::handler::{ErrorKind, Result};
use crate::pipeline::Orchestrator;
use crate::service::ServiceState;

/// Tracing target for analysis operations.
const TRACING_TARGET: &str = "archlens_server::handler::analyses";

/// Queues an analysis, or answers with the cached artifact.
///
/// Returns `200` with the artifact when the repository was analyzed before
/// and `force` is unset, `202` with the job id otherwise.
#[tracing::instrument(skip_all)]
async fn create_analysis(
    State(result_store): State<Arc<dyn ResultStore>>,
    State(orchestrator): State<Orchestrator>,
    ValidateJson(request): ValidateJson<CreateAnalysis>,
) -> Result<(StatusCode, Json<AnalysisCreated>)> {
    let repo = request.repo_identity()?;

    if !request.force
        && let Some(artifact) = result_store.get(&repo).await?
    {
        tracing::info!(
            target: TRACING_TARGET,
            owner = %repo.owner,
            name = %repo.name,
            "Serving cached artifact"
        );

        return Ok((StatusCode::OK, Json(AnalysisCreated::cached(artifact))));
    }

    let analysis_id = orchestrator.submit(AnalysisJob::new(repo)).await?;

    tracing::info!(
        target: TRACING_TARGET,
        analysis_id = %analysis_id,
        force = request.force,
        "Analysis accepted"
    );

    Ok((StatusCode::ACCEPTED, Json(AnalysisCreated::queued(analysis_id))))
}

/// Returns the latest snapshot of a job.
#[tracing::instrument(skip_all)]
async fn get_analysis(
    State(status_store): State<Arc<dyn StatusStore>>,
    Path(path_params): Path<AnalysisPathParams>,
) -> Result<(StatusCode, Json<AnalysisJob>)> {
    let Some(job) = status_store.get(&path_params.analysis_id).await? else {
        tracing::debug!(
            target: TRACING_TARGET,
            analysis_id = %path_params.analysis_id,
            "Analysis not found"
        );

        return Err(ErrorKind::NotFound
            .with_message("Analysis not found or expired")
            .with_resource("analysis"));
    };

    Ok((StatusCode::OK, Json(job)))
}

/// Returns a [`Router`] with all analysis routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/analyses", post(create_analysis))
        .route("/analyses/{analysisId}", get(get_analysis))
}

#[cfg(test)]
mod tests {
    use archlens_core::types::{AnalysisId, Phase};
    use serde_json::json;

    use super::*;
    use crate::handler::response::{AnalysisCreated, QueuedAnalysis};
    use crate::handler::test::{TestHarness, create_test_harness};
    use crate::pipeline::testing::wait_for_terminal;

    async fn queue(harness: &TestHarness) -> AnalysisId {
        let response = harness
            .server
            .post("/analyses")
            .json(&json!({ "owner": "acme", "name": "widgets" }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);

        match response.json::<AnalysisCreated>() {
            AnalysisCreated::Queued(QueuedAnalysis { analysis_id }) => analysis_id,
            AnalysisCreated::Cached(_) => panic!("expected a queued analysis"),
        }
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;
        let id = queue(&harness).await;
        wait_for_terminal(harness.status_store.as_ref(), &id).await;

        let response = harness
            .server
            .post("/analyses")
            .json(&json!({ "owner": "Acme", "name": "Widgets" }))
            .await;
        response.assert_status_ok();

        let AnalysisCreated::Cached(cached) = response.json::<AnalysisCreated>() else {
            panic!("expected the cached artifact");
        };
        assert!(cached.cached);
        assert_eq!(cached.artifact.repo_identity.full_name(), "acme/widgets");

        Ok(())
    }

    #[tokio::test]
    async fn force_bypasses_the_cache() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;
        let id = queue(&harness).await;
        wait_for_terminal(harness.status_store.as_ref(), &id).await;

        let response = harness
            .server
            .post("/analyses")
            .json(&json!({ "owner": "acme", "name": "widgets", "force": true }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);

        Ok(())
    }

    #[tokio::test]
    async fn snapshot_lookup() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;
        let id = queue(&harness).await;
        wait_for_terminal(harness.status_store.as_ref(), &id).await;

        let response = harness.server.get(&format!("/analyses/{id}")).await;
        response.assert_status_ok();

        let job = response.json::<AnalysisJob>();
        assert_eq!(job.id, id);
        assert_eq!(job.status.phase, Phase::Complete);
        assert!(job.result.is_some());

        let missing = AnalysisId::new_v7();
        let response = harness.server.get(&format!("/analyses/{missing}")).await;
        response.assert_status_not_found();

        let response = harness.server.get("/analyses/not-a-uuid").await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn malformed_identities_are_rejected() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;

        for body in [
            json!({ "owner": "", "name": "widgets" }),
            json!({ "owner": "-acme", "name": "widgets" }),
            json!({ "owner": "acme", "name": ".." }),
            json!({ "owner": "acme", "name": "widgets", "branch": "a..b" }),
            json!({ "name": "widgets" }),
        ] {
            let response = harness.server.post("/analyses").json(&body).await;
            response.assert_status_bad_request();
        }

        assert_eq!(harness.state.orchestrator().active_jobs(), 0);
        Ok(())
    }
}
