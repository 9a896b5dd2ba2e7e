//! Pinecone vector index over its REST data-plane API.

use crate::types::{DocumentFragment, ScoredFragment};
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Metadata key that holds the fragment text unless configured otherwise.
pub const DEFAULT_TEXT_KEY: &str = "text";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Client for one Pinecone index host.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
    text_key: String,
}

impl PineconeIndex {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http_client(host, api_key, Client::new())
    }

    pub fn with_http_client(
        host: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            namespace: None,
            text_key: DEFAULT_TEXT_KEY.to_string(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_text_key(mut self, text_key: impl Into<String>) -> Self {
        self.text_key = text_key.into();
        self
    }

    /// Split a match into fragment text and the remaining metadata.
    fn to_fragment(&self, m: QueryMatch) -> ScoredFragment {
        let mut metadata = m.metadata.unwrap_or_default();

        let text = match metadata.remove(&self.text_key) {
            Some(serde_json::Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => {
                tracing::warn!(
                    "Pinecone match '{}' has no '{}' metadata; using empty text",
                    m.id,
                    self.text_key
                );
                String::new()
            }
        };

        ScoredFragment::new(DocumentFragment { text, metadata }, m.score)
    }
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    fn backend_name(&self) -> &str {
        "pinecone"
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>> {
        let url = format!("{}/query", self.host);

        tracing::debug!(top_k, namespace = ?self.namespace, "Querying Pinecone");

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata: true,
                include_values: false,
                namespace: self.namespace.as_deref(),
            })
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to send request to Pinecone: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Index(format!(
                "Pinecone API error ({}): {}",
                status, error_text
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse Pinecone response: {}", e)))?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| self.to_fragment(m))
            .collect())
    }
}
