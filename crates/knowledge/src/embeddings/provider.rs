//! Embedding provider trait and factory.

use crate::embeddings::providers::{ollama::OllamaProvider, trigram::TrigramProvider};
use docchat_core::config::EmbeddingSettings;
use docchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// The same provider instance embeds the corpus at build time and every
/// query afterwards.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from configuration.
///
/// Remote providers are probed once. An unreachable service is only
/// reported; the provider is still returned and index builds fail until the
/// service comes up.
pub async fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.to_lowercase().as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(settings.dimensions))),

        "ollama" => {
            let provider = OllamaProvider::new(settings)?;
            if let Err(e) = provider.verify_connection().await {
                tracing::warn!("Embedding service not ready, indexing will fail until it is: {}", e);
            }
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let provider = create_provider(&EmbeddingSettings::default()).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_unreachable_ollama_still_creates_provider() {
        let settings = EmbeddingSettings {
            provider: "ollama".to_string(),
            endpoint: Some("http://127.0.0.1:1".to_string()),
            ..EmbeddingSettings::default()
        };

        let provider = create_provider(&settings).await.unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert!(provider.embed("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let settings = EmbeddingSettings {
            provider: "unknown".to_string(),
            ..EmbeddingSettings::default()
        };

        let result = create_provider(&settings).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&EmbeddingSettings::default()).await.unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
