//! Request extractors that reject with [`handler::Error`] bodies.
//!
//! - [`Json`] deserializes request bodies with descriptive rejections.
//! - [`ValidateJson`] additionally runs `validator` rules.
//! - [`Path`] deserializes path parameters.
//!
//! [`handler::Error`]: crate::handler::Error

pub mod reject;

pub use crate::extract::reject::{Json, Path, ValidateJson};
