//! OpenAI embeddings provider (`POST /embeddings`).

use crate::embeddings::provider::{check_dimensions, EmbeddingProvider};
use docchat_core::{AppError, AppResult};
use docchat_llm::providers::openai::DEFAULT_OPENAI_URL;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embeddings client. A whole batch goes out in one request.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http_client(None, api_key, DEFAULT_EMBEDDING_MODEL, Client::new())
    }

    pub fn with_http_client(
        base_url: Option<&str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, batch_size = texts.len(), "Requesting OpenAI embeddings");

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);

        body.data
            .into_iter()
            .map(|d| -> AppResult<Vec<f32>> {
                check_dimensions("OpenAI", self.dimensions, &d.embedding)?;
                Ok(d.embedding)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_embed_batch_against_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "text-embedding-ada-002",
                "input": ["first", "second"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "object": "list",
                    "data": [
                        {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                        {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                    ],
                    "model": "text-embedding-ada-002"
                }"#,
            )
            .create_async()
            .await;

        let provider = OpenAiProvider::with_http_client(
            Some(&server.url()),
            "sk-test",
            DEFAULT_EMBEDDING_MODEL,
            Client::new(),
        );
        let texts = vec!["first".to_string(), "second".to_string()];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_embedding_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let provider = OpenAiProvider::with_http_client(
            Some(&server.url()),
            "sk-bad",
            DEFAULT_EMBEDDING_MODEL,
            Client::new(),
        );
        let err = provider.embed("hello").await.unwrap_err();

        assert!(err.is_upstream());
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider = OpenAiProvider::with_http_client(
            Some("http://127.0.0.1:9"),
            "sk-test",
            DEFAULT_EMBEDDING_MODEL,
            Client::new(),
        );
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
