//! Cached artifact lookup.

use std::sync::Arc;

use archlens_core::store::ResultStore;
use archlens_core::types::{AnalysisArtifact, RepoIdentity};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use super::request::RepoPathParams;
use crate::extract::{Json, Path};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for artifact operations.
const TRACING_TARGET: &str = "archlens_server::handler::artifacts";

/// Returns the cached artifact of a repository.
#[tracing::instrument(skip_all)]
async fn get_artifact(
    State(result_store): State<Arc<dyn ResultStore>>,
    Path(path_params): Path<RepoPathParams>,
) -> Result<(StatusCode, Json<AnalysisArtifact>)> {
    let repo = RepoIdentity::new(path_params.owner, path_params.name)?;

    match result_store.get(&repo).await? {
        Some(artifact) => Ok((StatusCode::OK, Json(artifact))),
        None => {
            tracing::debug!(
                target: TRACING_TARGET,
                cache_key = %repo.cache_key(),
                "No cached artifact"
            );

            Err(ErrorKind::NotFound
                .with_message("Repository has not been analyzed")
                .with_resource("artifact"))
        }
    }
}

/// Returns a [`Router`] with all artifact routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/repos/{owner}/{name}/artifact", get(get_artifact))
}

#[cfg(test)]
mod tests {
    use archlens_core::analyzer::placeholder_artifact;
    use jiff::Timestamp;

    use super::*;
    use crate::handler::test::create_test_harness;

    #[tokio::test]
    async fn serves_cached_artifacts() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;

        let response = harness.server.get("/repos/acme/widgets/artifact").await;
        response.assert_status_not_found();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "not_found");
        assert_eq!(body["resource"], "artifact");

        let repo = RepoIdentity::new("acme", "widgets")?;
        let artifact = placeholder_artifact(&repo, Timestamp::UNIX_EPOCH);
        harness.result_store.put(&artifact).await?;

        let response = harness.server.get("/repos/ACME/widgets/artifact").await;
        response.assert_status_ok();
        assert_eq!(response.json::<AnalysisArtifact>(), artifact);

        Ok(())
    }

    #[tokio::test]
    async fn rejects_invalid_repository_names() -> anyhow::Result<()> {
        let harness = create_test_harness().await?;

        let response = harness.server.get("/repos/-acme/widgets/artifact").await;
        response.assert_status_bad_request();

        Ok(())
    }
}
