//! Answer generation from an assembled prompt.

use docchat_core::AppResult;
use docchat_llm::{LlmClient, LlmRequest};
use std::sync::Arc;

/// Sends the QA prompt to the completion model.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// One zero-temperature completion; the text comes back untouched.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.model).with_temperature(0.0);
        let response = self.client.complete(&request).await?;

        tracing::debug!(
            provider = self.client.provider_name(),
            total_tokens = response.usage.total_tokens,
            "Generated answer"
        );

        Ok(response.content)
    }
}
