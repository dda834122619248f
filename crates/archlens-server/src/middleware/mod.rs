//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Error handling (panics, timeouts, service errors)
//! - Observability (tracing, request IDs)
//! - CORS for the browser front end
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use axum::Router;
//! use archlens_server::middleware::{CorsConfig, RouterExt};
//!
//! let app: Router = Router::new()
//!     .with_error_handling_layer(Duration::from_secs(30))
//!     .with_cors_layer(&CorsConfig::default())
//!     .with_observability_layer();
//! ```

mod cors;
mod extensions;
mod observability;
mod recovery;

pub use cors::CorsConfig;
pub use extensions::RouterExt;
pub use recovery::RecoveryConfig;
