//! Pipeline configuration.

use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Default maximum concurrent jobs.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct PipelineConfig {
    /// Maximum number of analyses running at the same time.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PIPELINE_MAX_CONCURRENT_JOBS", default_value_t = DEFAULT_MAX_CONCURRENT_JOBS)
    )]
    pub max_concurrent_jobs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
        }
    }
}

impl PipelineConfig {
    /// Creates a new pipeline configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum concurrent jobs.
    pub fn with_max_concurrent_jobs(mut self, max_concurrent_jobs: usize) -> Self {
        self.max_concurrent_jobs = max_concurrent_jobs;
        self
    }

    /// Creates the semaphore bounding concurrent jobs, at least one permit.
    pub fn create_semaphore(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.max_concurrent_jobs.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semaphore_has_at_least_one_permit() {
        let config = PipelineConfig::new().with_max_concurrent_jobs(0);
        assert_eq!(config.create_semaphore().available_permits(), 1);

        let config = PipelineConfig::default();
        assert_eq!(
            config.create_semaphore().available_permits(),
            DEFAULT_MAX_CONCURRENT_JOBS
        );
    }
}
