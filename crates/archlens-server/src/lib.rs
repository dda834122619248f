#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod pipeline;
pub mod service;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};

/// Tracing target for service startup and wiring.
pub const TRACING_TARGET_SERVICE: &str = "archlens_server::service";

/// Tracing target for the job orchestrator.
pub const TRACING_TARGET_PIPELINE: &str = "archlens_server::pipeline";

/// Tracing target for the status stream.
pub const TRACING_TARGET_STREAM: &str = "archlens_server::handler::events";
