//! Completion providers used by the analyzer.

mod completion;
mod model;

pub use completion::CompletionProvider;
pub use model::{AnthropicModel, OpenAiModel};
