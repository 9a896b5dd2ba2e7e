//! Completion service integration for docchat.
//!
//! This crate provides a provider-agnostic abstraction over completion
//! models. The pipeline only ever sees the [`LlmClient`] trait, so providers
//! can be swapped or mocked without touching pipeline logic.
//!
//! # Providers
//! - **OpenAI**: hosted chat completions API (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use docchat_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, http_client, ClientSettings};
pub use providers::{OllamaClient, OpenAiClient};
pub use retry::{with_retry, RetryingLlmClient};
pub use types::ProviderType;
