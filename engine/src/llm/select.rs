//! Provider selection
//!
//! The provider is chosen once, from configuration, when the process starts.
//! Everything downstream only sees `Arc<dyn LLMProvider>`.

use super::anthropic::AnthropicProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAIProvider;
use super::{LLMProvider, SamplingParams};
use crate::config::{LLMConfig, ProviderKind};
use crate::secrets::SecretManager;
use std::sync::Arc;

/// Build the configured text-generation provider
pub fn build_provider(config: &LLMConfig, secrets: SecretManager) -> Arc<dyn LLMProvider> {
    let params = SamplingParams::from(config);

    tracing::info!(
        provider = %config.default_provider,
        model = config.selected_model(),
        "Selected text-generation provider"
    );

    match config.default_provider {
        ProviderKind::OpenAI => Arc::new(OpenAIProvider::new(
            config.openai.clone(),
            params,
            secrets,
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            config.anthropic.clone(),
            params,
            secrets,
        )),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(config.ollama.clone(), params)),
    }
}
