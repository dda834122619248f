#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for status and result store operations.
pub const TRACING_TARGET_STORE: &str = "archlens_core::store";

/// Tracing target for analyzer operations.
pub const TRACING_TARGET_ANALYZER: &str = "archlens_core::analyzer";

mod error;

pub mod analyzer;
pub mod diagram;
pub mod label;
pub mod source;
pub mod store;
pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, Error, ErrorKind, Result};
