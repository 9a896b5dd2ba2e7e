//! Completion provider factory.
//!
//! Resolves a provider name into a concrete [`LlmClient`] with its HTTP
//! client, endpoint and credentials already wired in.

use crate::client::LlmClient;
use crate::providers::{ollama::DEFAULT_OLLAMA_URL, openai::DEFAULT_OPENAI_URL};
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use docchat_core::config::ProviderConfig;
use docchat_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Default transport timeout for upstream HTTP calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for a provider client.
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// API key (required for hosted providers)
    pub api_key: Option<String>,

    /// OpenAI organization id
    pub organization: Option<String>,

    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl ClientSettings {
    /// Settings for `provider` taken from the `llm.providers` section,
    /// with the API key resolved from the environment.
    pub fn from_config(config: &AppConfig, provider: &str) -> Self {
        let provider_config = config.get_provider_config(provider);

        let organization = match provider_config {
            Some(ProviderConfig::OpenAI {
                organization_env: Some(env),
                ..
            }) => std::env::var(env).ok(),
            _ => None,
        };

        Self {
            endpoint: provider_config.and_then(|p| p.endpoint()).map(str::to_string),
            api_key: config.resolve_api_key(provider),
            organization,
            timeout_secs: provider_config.and_then(|p| p.timeout()),
        }
    }
}

/// Build an HTTP client with the transport timeout applied.
pub fn http_client(timeout_secs: Option<u64>) -> AppResult<reqwest::Client> {
    let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Create a completion client based on the provider name.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a hosted
/// provider has no API key.
pub fn create_client(provider: &str, settings: &ClientSettings) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = settings.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            let client =
                OllamaClient::with_http_client(base_url, http_client(settings.timeout_secs)?);
            Ok(Arc::new(client))
        }
        Some(ProviderType::OpenAI) => {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let base_url = settings.endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_URL);

            let mut client =
                OpenAiClient::with_http_client(base_url, api_key, http_client(settings.timeout_secs)?);
            if let Some(ref organization) = settings.organization {
                client = client.with_organization(organization);
            }
            Ok(Arc::new(client))
        }
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
