//! Completion provider abstraction.

use std::sync::Arc;

use rig::completion::{AssistantContent, CompletionError, CompletionModel as RigCompletionModel};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, openai};

use super::model::{AnthropicModel, OpenAiModel};
use crate::config::{AiProvider, AnalyzerConfig};
use crate::{Error, Result, TRACING_TARGET_PROVIDER};

/// Completion provider that wraps the supported rig completion models.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

enum CompletionService {
    OpenAi {
        model: openai::CompletionModel,
        model_name: String,
    },
    Anthropic {
        model: anthropic::completion::CompletionModel,
        model_name: String,
    },
}

impl CompletionProvider {
    /// Creates an Anthropic completion provider.
    pub fn anthropic(api_key: &str, model: &str) -> Result<Self> {
        let client = anthropic::Client::new(api_key)
            .map_err(|e| Error::provider("anthropic", e.to_string()))?;
        Ok(Self(Arc::new(CompletionService::Anthropic {
            model: client.completion_model(model),
            model_name: model.to_owned(),
        })))
    }

    /// Creates an OpenAI completion provider.
    pub fn openai(api_key: &str, model: &str) -> Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e.to_string()))?
            .completions_api();
        Ok(Self(Arc::new(CompletionService::OpenAi {
            model: client.completion_model(model),
            model_name: model.to_owned(),
        })))
    }

    /// Creates the provider named by the configuration.
    ///
    /// Returns `Ok(None)` when no provider is selected or no API key is set.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };

        let provider = match config.provider {
            AiProvider::None => return Ok(None),
            AiProvider::Anthropic => {
                let default = AnthropicModel::default();
                let model = config.model.as_deref().unwrap_or(default.as_ref());
                Self::anthropic(api_key, model)?
            }
            AiProvider::OpenAi => {
                let default = OpenAiModel::default();
                let model = config.model.as_deref().unwrap_or(default.as_ref());
                Self::openai(api_key, model)?
            }
        };

        Ok(Some(provider))
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => model_name,
            CompletionService::Anthropic { model_name, .. } => model_name,
        }
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            CompletionService::OpenAi { .. } => "openai",
            CompletionService::Anthropic { .. } => "anthropic",
        }
    }

    /// Sends a single-turn completion request and returns the answer text.
    pub async fn complete(&self, preamble: &str, prompt: &str, max_tokens: u64) -> Result<String> {
        let map_err = |e: CompletionError| Error::provider(self.provider_name(), e.to_string());

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider = self.provider_name(),
            model = self.model_name(),
            prompt_bytes = prompt.len(),
            "Sending completion request"
        );

        let answer = match self.0.as_ref() {
            CompletionService::OpenAi { model, .. } => model
                .completion_request(prompt)
                .preamble(preamble.to_owned())
                .max_tokens(max_tokens)
                .send()
                .await
                .map(|r| extract_text_content(&r.choice))
                .map_err(map_err),
            CompletionService::Anthropic { model, .. } => model
                .completion_request(prompt)
                .preamble(preamble.to_owned())
                .max_tokens(max_tokens)
                .send()
                .await
                .map(|r| extract_text_content(&r.choice))
                .map_err(map_err),
        }?;

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider = self.provider_name(),
            answer_bytes = answer.len(),
            "Completion received"
        );

        Ok(answer)
    }
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.model_name())
            .finish()
    }
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}
