//! LLM provider factory.
//!
//! Creates the generation client from configuration. Provider resolution and
//! secret lookup happen here, once, at startup.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use docchat_core::config::GenerationSettings;
use docchat_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client from the generation settings.
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - The provider needs an API key and its environment variable is unset
/// - Client initialization fails
pub fn create_client(settings: &GenerationSettings) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;

    let base_url = settings
        .endpoint
        .as_deref()
        .unwrap_or_else(|| provider.default_endpoint());

    tracing::debug!(provider = provider.as_str(), base_url, "Creating LLM client");

    match provider {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_timeout(
            base_url,
            settings.timeout_secs,
        )?)),
        ProviderType::Groq | ProviderType::OpenAI => {
            let api_key = AppConfig::resolve_api_key(settings.api_key_env.as_deref())?
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "{} provider requires apiKeyEnv",
                        provider.as_str()
                    ))
                })?;
            Ok(Arc::new(OpenAiClient::new(
                provider.as_str(),
                base_url,
                api_key,
                settings.timeout_secs,
            )?))
        }
    }
}
