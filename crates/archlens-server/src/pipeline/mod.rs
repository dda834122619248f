//! Background execution of analysis jobs.
//!
//! The [`Orchestrator`] owns every running job: it is the only writer of job
//! snapshots in the status store, bounds concurrency with a semaphore, and
//! drains in-flight jobs on shutdown.
//!
//! ## Phases
//!
//! | Phase         | Progress | Work                                   |
//! |---------------|----------|----------------------------------------|
//! | `downloading` | 0, 10    | queued, then fetching the tarball      |
//! | `extracting`  | 30       | unpacking source files                 |
//! | `analyzing`   | 50       | producing diagram and flows            |
//! | `generating`  | 80       | persisting the artifact                |
//! | `complete`    | 100      | artifact attached to the job           |
//!
//! Any failure moves the job to `error` and stops it.

mod config;
mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DEFAULT_MAX_CONCURRENT_JOBS, PipelineConfig};
pub use orchestrator::Orchestrator;
