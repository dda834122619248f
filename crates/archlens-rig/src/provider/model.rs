//! Type-safe completion model references.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Anthropic models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AnthropicModel {
    /// Claude Opus 4 (most capable)
    #[strum(serialize = "claude-opus-4-20250514")]
    ClaudeOpus4,
    /// Claude Sonnet 4 (balanced)
    #[default]
    #[strum(serialize = "claude-sonnet-4-20250514")]
    ClaudeSonnet4,
    /// Claude Haiku 3.5 (fast)
    #[strum(serialize = "claude-3-5-haiku-20241022")]
    ClaudeHaiku35,
}

/// OpenAI completion models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OpenAiModel {
    /// GPT-4o (multimodal flagship)
    #[default]
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    /// GPT-4o mini (fast, affordable)
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
    /// GPT-4 Turbo
    #[strum(serialize = "gpt-4-turbo")]
    Gpt4Turbo,
}
