//! Embedding provider settings resolved from the application config.

use docchat_core::{AppConfig, AppResult};
use serde::{Deserialize, Serialize};

/// Settings for the embedding provider used by the retriever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama" or "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Expected vector length; responses of another length are rejected
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Custom endpoint URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key for hosted providers
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider("mock")
    }
}

impl EmbeddingConfig {
    /// Defaults for a provider with no further configuration.
    pub fn for_provider(provider: &str) -> Self {
        let (model, dimensions) = default_model(provider);
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            endpoint: None,
            api_key: None,
            timeout_secs: None,
        }
    }

    /// Resolve the embedding settings for `config.embedding_provider`.
    ///
    /// The provider's `embeddingModel`, endpoint and timeout come from the
    /// `llm.providers` section when present.
    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        let provider = config.embedding_provider.as_str();
        let mut embedding = Self::for_provider(provider);

        if let Some(provider_config) = config.get_provider_config(provider) {
            if let Some(model) = provider_config.embedding_model() {
                embedding.model = model.to_string();
                // only the built-in default model has a known width
                embedding.dimensions = None;
            }
            embedding.endpoint = provider_config.endpoint().map(str::to_string);
            embedding.timeout_secs = provider_config.timeout();
        }

        embedding.api_key = config.resolve_api_key(provider);

        tracing::debug!(
            "Embedding config: provider={}, model={}, dimensions={:?}",
            embedding.provider,
            embedding.model,
            embedding.dimensions
        );

        Ok(embedding)
    }
}

fn default_model(provider: &str) -> (&'static str, Option<usize>) {
    match provider {
        "openai" => ("text-embedding-ada-002", Some(1536)),
        "ollama" => ("nomic-embed-text", Some(768)),
        _ => ("trigram-v1", Some(384)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::config::{LlmConfig, ProviderConfig};
    use std::collections::HashMap;

    #[test]
    fn test_defaults_per_provider() {
        let openai = EmbeddingConfig::for_provider("openai");
        assert_eq!(openai.model, "text-embedding-ada-002");
        assert_eq!(openai.dimensions, Some(1536));

        let mock = EmbeddingConfig::default();
        assert_eq!(mock.provider, "mock");
        assert_eq!(mock.dimensions, Some(384));
    }

    #[test]
    fn test_from_app_config_uses_provider_section() {
        let mut providers = HashMap::new();
        providers.insert(
            "ollama".to_string(),
            ProviderConfig::Ollama {
                endpoint: "http://gpu-box:11434".to_string(),
                model: "llama3.2".to_string(),
                embedding_model: Some("mxbai-embed-large".to_string()),
                timeout: Some(10),
            },
        );

        let config = AppConfig {
            embedding_provider: "ollama".to_string(),
            llm: Some(LlmConfig {
                active_provider: "ollama".to_string(),
                active_embedding_provider: "ollama".to_string(),
                providers,
            }),
            ..AppConfig::default()
        };

        let embedding = EmbeddingConfig::from_app_config(&config).unwrap();
        assert_eq!(embedding.model, "mxbai-embed-large");
        assert_eq!(embedding.dimensions, None);
        assert_eq!(embedding.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(embedding.timeout_secs, Some(10));
    }

    #[test]
    fn test_api_key_override_is_picked_up() {
        let config = AppConfig {
            embedding_provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };

        let embedding = EmbeddingConfig::from_app_config(&config).unwrap();
        assert_eq!(embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(embedding.model, "text-embedding-ada-002");
    }
}
