#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;
mod telemetry;

use std::process;

use anyhow::Context;
use archlens_server::handler::routes;
use archlens_server::middleware::RouterExt;
use archlens_server::service::ServiceState;
use axum::Router;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "archlens_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "archlens_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "archlens_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing(cli.log_format)?;
    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service)
        .await
        .context("failed to create service state")?;
    let orchestrator = state.orchestrator().clone();
    let router = create_router(state, &cli.middleware);

    server::serve(router, orchestrator, &cli.server).await?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Observability - request IDs and tracing spans
/// 2. CORS
/// 3. Routes (innermost) - recovery is applied per route group
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes(&middleware.recovery)
        .with_cors_layer(&middleware.cors)
        .with_observability_layer()
        .with_state(state)
}
