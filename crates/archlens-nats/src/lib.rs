#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for NATS client operations.
///
/// Use this target for logging client initialization, configuration, and client-level errors.
pub const TRACING_TARGET_CLIENT: &str = "archlens_nats::client";

/// Tracing target for NATS key-value store operations.
pub const TRACING_TARGET_KV: &str = "archlens_nats::kv";

/// Tracing target for NATS connection operations.
pub const TRACING_TARGET_CONNECTION: &str = "archlens_nats::connection";

mod client;
mod error;
pub mod kv;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
pub use kv::NatsStatusStore;
