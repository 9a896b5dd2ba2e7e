//! Retry decorator for embedding providers.

use crate::embeddings::provider::EmbeddingProvider;
use docchat_core::{AppResult, RetryPolicy};
use std::sync::Arc;

#[derive(Debug)]
pub struct RetryingEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    policy: RetryPolicy,
}

impl RetryingEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for RetryingEmbeddingProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.policy
            .run("embeddings.embed_batch", || self.inner.embed_batch(texts))
            .await
    }
}

/// Decorate `provider` with retries unless the policy makes a single attempt.
pub fn with_retry(
    provider: Arc<dyn EmbeddingProvider>,
    policy: RetryPolicy,
) -> Arc<dyn EmbeddingProvider> {
    if policy.is_enabled() {
        Arc::new(RetryingEmbeddingProvider::new(provider, policy))
    } else {
        provider
    }
}
