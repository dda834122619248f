//! Request types for HTTP handlers.

mod analyses;
mod paths;

pub use analyses::*;
pub use paths::*;
