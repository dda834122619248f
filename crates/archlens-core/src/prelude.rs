//! Convenience re-exports for downstream crates.

pub use crate::analyzer::{Analyzer, PlaceholderAnalyzer};
pub use crate::diagram::{DiagramEdge, DiagramGraph, DiagramNode};
pub use crate::label::LabelQuery;
pub use crate::source::{SourceArchive, SourceFetcher, SourceFile};
pub use crate::store::{
    CacheLocation, MemoryResultStore, MemoryStatusStore, ResultStore, StatusStore,
};
pub use crate::types::{
    AnalysisArtifact, AnalysisId, AnalysisJob, AnimationStep, ArtifactError, CacheKey, Flow,
    JobStatus, Phase, RepoIdentity,
};
pub use crate::{Error, ErrorKind, Result};
