//! Vector index abstraction for document fragments.
//!
//! Defines a trait for provider-agnostic similarity search, the retry
//! decorator around it, and the factory that picks a backend from config.

use crate::pinecone_index::PineconeIndex;
use crate::sqlite_index::SqliteIndex;
use crate::types::ScoredFragment;
use docchat_core::config::IndexBackend;
use docchat_core::{AppConfig, AppError, AppResult, RetryPolicy};
use docchat_llm::http_client;
use std::sync::Arc;

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs (e.g. "sqlite", "pinecone")
    fn backend_name(&self) -> &str;

    /// Return up to `top_k` fragments most similar to `vector`.
    ///
    /// Results come back in the backend's own order, which is normally
    /// by descending score.
    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>>;
}

/// Wraps an index and retries failed queries according to a policy.
pub struct RetryingIndex {
    inner: Arc<dyn VectorIndex>,
    policy: RetryPolicy,
}

impl RetryingIndex {
    pub fn new(inner: Arc<dyn VectorIndex>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl VectorIndex for RetryingIndex {
    fn backend_name(&self) -> &str {
        self.inner.backend_name()
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>> {
        self.policy
            .run("index.query", || self.inner.query(vector, top_k))
            .await
    }
}

/// Decorate `index` with retries unless the policy makes a single attempt.
pub fn with_retry(index: Arc<dyn VectorIndex>, policy: RetryPolicy) -> Arc<dyn VectorIndex> {
    if policy.is_enabled() {
        Arc::new(RetryingIndex::new(index, policy))
    } else {
        index
    }
}

/// Open the configured index backend.
///
/// # Errors
/// `AppError::Config` when the index name, Pinecone host or Pinecone API key
/// is missing.
pub fn create_index(config: &AppConfig) -> AppResult<Arc<dyn VectorIndex>> {
    let name = config.index_name()?;

    match config.index.backend {
        IndexBackend::Sqlite => {
            let path = config.sqlite_index_path()?;
            tracing::info!("Using SQLite index '{}' at {:?}", name, path);
            Ok(Arc::new(SqliteIndex::open(&path)?))
        }
        IndexBackend::Pinecone => {
            let host = config.index.host.as_deref().ok_or_else(|| {
                AppError::Config(format!("Pinecone index '{}' requires index.host", name))
            })?;
            let api_key = std::env::var(&config.index.api_key_env).map_err(|_| {
                AppError::Config(format!(
                    "Pinecone API key not found. Set {}",
                    config.index.api_key_env
                ))
            })?;

            tracing::info!("Using Pinecone index '{}' at {}", name, host);

            let mut index = PineconeIndex::with_http_client(host, api_key, http_client(None)?)
                .with_text_key(&config.index.text_key);
            if let Some(ref namespace) = config.index.namespace {
                index = index.with_namespace(namespace);
            }
            Ok(Arc::new(index))
        }
    }
}
