//! Error types for docchat.
//!
//! One enum covers the whole taxonomy: configuration problems, caller input
//! problems, and failures reported by the three upstream services
//! (completion, embedding, vector index).

use thiserror::Error;

/// Unified error type for docchat.
///
/// All fallible functions return `Result<T, AppError>`. Upstream failures
/// carry the upstream message verbatim so the caller sees what went wrong.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required setting is missing or invalid (e.g. the index name).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or empty question.
    #[error("Input error: {0}")]
    Input(String),

    /// Completion service failures
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding service failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index query failures
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error came from one of the external services.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Llm(_) | AppError::Embedding(_) | AppError::Index(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
