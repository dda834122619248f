//! Analyzer configuration.

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// Completion provider used for analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AiProvider {
    /// Anthropic messages API.
    Anthropic,
    /// OpenAI chat completions API.
    #[strum(serialize = "openai")]
    #[serde(rename = "openai")]
    #[cfg_attr(feature = "config", value(name = "openai"))]
    OpenAi,
    /// No model; every repository gets the placeholder artifact.
    #[default]
    None,
}

/// Configuration of the repository analyzer.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct AnalyzerConfig {
    /// Completion provider
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ai-provider",
            env = "ARCHLENS_AI_PROVIDER",
            value_enum,
            default_value_t = AiProvider::None
        )
    )]
    pub provider: AiProvider,

    /// API key of the completion provider
    #[cfg_attr(feature = "config", arg(long = "ai-api-key", env = "ARCHLENS_AI_API_KEY"))]
    pub api_key: Option<String>,

    /// Model name; defaults to the provider's recommended model
    #[cfg_attr(feature = "config", arg(long = "ai-model", env = "ARCHLENS_AI_MODEL"))]
    pub model: Option<String>,

    /// Upper bound of source bytes sent to the model
    #[cfg_attr(
        feature = "config",
        arg(long = "ai-source-budget", env = "ARCHLENS_AI_SOURCE_BUDGET", default_value_t = 120_000)
    )]
    pub source_budget: usize,

    /// Maximum tokens of the model answer
    #[cfg_attr(
        feature = "config",
        arg(long = "ai-max-tokens", env = "ARCHLENS_AI_MAX_TOKENS", default_value_t = 8192)
    )]
    pub max_tokens: u64,
}

impl std::fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("source_budget", &self.source_budget)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::None,
            api_key: None,
            model: None,
            source_budget: 120_000,
            max_tokens: 8192,
        }
    }
}

impl AnalyzerConfig {
    /// Anthropic with the default model.
    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self {
            provider: AiProvider::Anthropic,
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// OpenAI with the default model.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider: AiProvider::OpenAi,
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Overrides the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the API key when one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_count_as_missing() {
        let mut config = AnalyzerConfig::anthropic("  ");
        assert_eq!(config.api_key(), None);

        config.api_key = Some("sk-test".to_owned());
        assert_eq!(config.api_key(), Some("sk-test"));
    }

    #[test]
    fn debug_hides_the_key() {
        let config = AnalyzerConfig::openai("sk-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("OpenAi"));
    }

    #[test]
    fn provider_names() {
        assert_eq!(AiProvider::OpenAi.to_string(), "openai");
        assert_eq!("anthropic".parse::<AiProvider>().unwrap(), AiProvider::Anthropic);
        assert_eq!(AiProvider::default(), AiProvider::None);
    }
}
