//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use archlens_server::handler::routes;
//! use archlens_server::middleware::{RecoveryConfig, RouterExt};
//! use archlens_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let state = ServiceState::from_config(&config).await?;
//!
//! let router: axum::Router = routes(&RecoveryConfig::default())
//!     .with_observability_layer()
//!     .with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod analyses;
mod artifacts;
mod error;
mod events;
mod monitors;
pub mod request;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::events::StreamError;
use crate::middleware::{RecoveryConfig, RouterExt};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes.
///
/// Request/response routes get the timeout from `recovery`. The status
/// stream only gets panic recovery since it stays open until the job ends.
pub fn routes(recovery: &RecoveryConfig) -> Router<ServiceState> {
    let api_router = Router::new()
        .merge(analyses::routes())
        .merge(artifacts::routes())
        .merge(monitors::routes())
        .with_error_handling_layer(recovery.request_timeout());

    let stream_router = events::routes().with_panic_recovery_layer();

    Router::new()
        .merge(api_router)
        .merge(stream_router)
        .fallback(handler)
}
