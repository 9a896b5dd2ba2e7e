//! Embedding providers used to turn the standalone question into a vector.

pub mod config;
pub mod provider;
pub mod providers;
pub mod retry;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
pub use retry::{with_retry, RetryingEmbeddingProvider};
