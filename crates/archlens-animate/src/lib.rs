#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for playback state changes.
pub const TRACING_TARGET_ENGINE: &str = "archlens_animate::engine";

/// Tracing target for node and edge resolution.
pub const TRACING_TARGET_HIGHLIGHT: &str = "archlens_animate::highlight";

mod config;
mod engine;
mod error;
mod scene;
mod surface;

pub use config::{EdgeStrategy, EngineConfig};
pub use engine::{AnimationEngine, Command, EngineSnapshot, PlaybackState};
pub use error::{EngineError, Result};
pub use scene::Scene;
pub use surface::{DiagramSurface, EdgeStyle, NodeEmphasis};
