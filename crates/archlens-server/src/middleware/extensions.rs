//! Extension traits for `axum::Router` to easily apply middleware layers.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use super::CorsConfig;
use super::observability::{
    create_propagate_request_id_layer, create_request_id_layer, create_sensitive_headers_layer,
    create_trace_layer,
};
use super::recovery::{catch_panic, handle_error};

/// Extension trait for `axum::`[`Router`] for layering middleware.
pub trait RouterExt<S> {
    /// Layers [`HandleError`], [`CatchPanic`] and [`Timeout`] middlewares.
    ///
    /// [`HandleError`]: axum::error_handling::HandleErrorLayer
    /// [`CatchPanic`]: tower_http::catch_panic::CatchPanicLayer
    /// [`Timeout`]: tower::timeout::TimeoutLayer
    fn with_error_handling_layer(self, timeout: Duration) -> Self;

    /// Layers only the [`CatchPanic`] middleware, for long-lived responses.
    ///
    /// [`CatchPanic`]: tower_http::catch_panic::CatchPanicLayer
    fn with_panic_recovery_layer(self) -> Self;

    /// Layers [`SetRequestId`], [`Trace`] and [`PropagateRequestId`] middlewares.
    ///
    /// [`SetRequestId`]: tower_http::request_id::SetRequestIdLayer
    /// [`Trace`]: tower_http::trace::TraceLayer
    /// [`PropagateRequestId`]: tower_http::request_id::PropagateRequestIdLayer
    fn with_observability_layer(self) -> Self;

    /// Layers the CORS middleware.
    fn with_cors_layer(self, config: &CorsConfig) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_error_handling_layer(self, timeout: Duration) -> Self {
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(TimeoutLayer::new(timeout));

        self.layer(middlewares)
    }

    fn with_panic_recovery_layer(self) -> Self {
        self.layer(CatchPanicLayer::custom(catch_panic))
    }

    fn with_observability_layer(self) -> Self {
        // Apply layers in reverse order (last layer wraps first)
        self.layer(create_propagate_request_id_layer())
            .layer(create_sensitive_headers_layer())
            .layer(create_trace_layer())
            .layer(create_request_id_layer())
    }

    fn with_cors_layer(self, config: &CorsConfig) -> Self {
        self.layer(config.create_layer())
    }
}
