//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig          # Host, port, shutdown
//! ├── middleware: MiddlewareConfig  # CORS, request timeout
//! ├── service: ServiceConfig        # Stores, GitHub, analyzer, pipeline, stream
//! └── log_format: LogFormat         # text or json
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use archlens_server::service::ServiceConfig;
use clap::Parser;

pub use self::middleware::MiddlewareConfig;
pub use self::server::ServerConfig;
use crate::telemetry::LogFormat;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "archlens")]
#[command(about = "Animated architecture diagrams for GitHub repositories")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Stores, source download, analyzer and job settings.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is read before parsing so that clap picks its values up
    /// as environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration (no secrets).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        let store = &self.service.store;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            status_backend = %store.status_backend,
            status_ttl_secs = store.status_ttl_secs,
            result_backend = ?store.result.backend_type,
            result_root = %store.result.root,
            "Store configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            ai_provider = ?self.service.analyzer.provider,
            max_concurrent_jobs = self.service.pipeline.max_concurrent_jobs,
            stream_poll_interval_ms = self.service.stream.stream_poll_interval_ms,
            "Pipeline configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
