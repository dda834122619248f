//! HTTP server startup and graceful shutdown.
//!
//! Shutdown runs in two bounded stages: the listener stops accepting and
//! open connections get up to the shutdown timeout to finish, then running
//! analyses get the same budget to reach a terminal status.

mod error;
mod shutdown;

use std::future::IntoFuture;
use std::time::Instant;

use archlens_server::pipeline::Orchestrator;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use self::error::{Result, ServerError};
use self::shutdown::shutdown_signal;
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Serves `app` until a shutdown signal, then drains `orchestrator`.
pub async fn serve(app: Router, orchestrator: Orchestrator, config: &ServerConfig) -> Result<()> {
    let server_addr = config.server_addr();
    let listener = match TcpListener::bind(server_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            let error = ServerError::bind_error(server_addr, err);
            tracing::error!(
                target: TRACING_TARGET_SERVER_STARTUP,
                addr = %server_addr,
                error = %error,
                suggestion = error.suggestion(),
                "Failed to bind to address"
            );
            return Err(error);
        }
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "Server is ready and listening for connections"
    );

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server bound to all interfaces (0.0.0.0) - ensure firewall is configured"
        );
    }

    let start_time = Instant::now();
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        let orchestrator = orchestrator.clone();
        async move {
            shutdown_signal().await;
            orchestrator.shutdown();
            shutdown.cancel();
        }
    });

    let server = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(config.shutdown_timeout()).await;
    };

    tokio::select! {
        result = server => result.map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %err,
                "Server encountered an error"
            );
            ServerError::Runtime(err)
        })?,
        () = deadline => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = config.shutdown_timeout,
                "Connections still open at shutdown deadline"
            );
        }
    }

    if !orchestrator.is_shutting_down() {
        orchestrator.shutdown();
    }
    orchestrator.drain(config.shutdown_timeout()).await;

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        uptime_secs = start_time.elapsed().as_secs(),
        "Shutdown completed"
    );

    Ok(())
}
