//! Middleware configuration for the HTTP server.
//!
//! ```bash
//! archlens --cors-origins "https://archlens.dev" --request-timeout 60
//! ```

use archlens_server::middleware::{CorsConfig, RecoveryConfig};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Middleware configuration combining CORS and recovery settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Origins allowed to call the API from a browser.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// Request timeout for every route but the status stream.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            request_timeout_secs = self.recovery.request_timeout,
            "Middleware configuration"
        );
    }
}
