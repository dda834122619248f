#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod analyzer;
mod config;
mod error;
pub mod prompt;
pub mod provider;
pub mod response;

pub use analyzer::{RigAnalyzer, from_config};
pub use config::{AiProvider, AnalyzerConfig};
pub use error::{Error, Result};

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "archlens_rig";

/// Tracing target for provider calls.
pub const TRACING_TARGET_PROVIDER: &str = "archlens_rig::provider";
