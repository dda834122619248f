//! Analysis data model.

mod artifact;
mod job;
mod phase;
mod repository;

pub use artifact::{AnalysisArtifact, AnimationStep, ArtifactError, Flow};
pub use job::{AnalysisId, AnalysisJob, JobStatus};
pub use phase::Phase;
pub use repository::{CacheKey, RepoIdentity};
