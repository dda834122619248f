//! Response types for HTTP handlers.

mod analyses;
mod errors;
mod monitors;

pub use analyses::*;
pub use errors::*;
pub use monitors::*;
