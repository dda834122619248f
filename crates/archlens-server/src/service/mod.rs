//! Application state and dependency injection.

mod config;
mod state;
mod store;
mod stream;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder, ServiceConfigBuilderError};
pub use crate::service::state::ServiceState;
pub use crate::service::store::{StatusBackend, StoreConfig};
pub use crate::service::stream::StreamConfig;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};
