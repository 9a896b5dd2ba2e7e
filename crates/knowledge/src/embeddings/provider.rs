//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{MockProvider, OllamaProvider, OpenAiProvider};
use docchat_core::{AppError, AppResult};
use docchat_llm::http_client;
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate embeddings for multiple texts, one vector per text in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "mock" => {
            let provider = MockProvider::new(config.dimensions.unwrap_or(384));
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let client = http_client(config.timeout_secs)?;
            let mut provider =
                OllamaProvider::with_http_client(config.endpoint.as_deref(), &config.model, client);
            if let Some(dimensions) = config.dimensions {
                provider = provider.with_dimensions(dimensions);
            }
            Ok(Arc::new(provider))
        }

        "openai" => {
            let api_key = config.api_key.as_deref().ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires API key".to_string())
            })?;
            let client = http_client(config.timeout_secs)?;
            let mut provider = OpenAiProvider::with_http_client(
                config.endpoint.as_deref(),
                api_key,
                &config.model,
                client,
            );
            if let Some(dimensions) = config.dimensions {
                provider = provider.with_dimensions(dimensions);
            }
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, openai, ollama",
            config.provider
        ))),
    }
}

/// Reject a vector whose length differs from the configured width.
pub(crate) fn check_dimensions(
    provider: &str,
    expected: Option<usize>,
    embedding: &[f32],
) -> AppResult<()> {
    match expected {
        Some(expected) if embedding.len() != expected => Err(AppError::Embedding(format!(
            "{} returned {} dimensions, expected {}",
            provider,
            embedding.len(),
            expected
        ))),
        _ => Ok(()),
    }
}
