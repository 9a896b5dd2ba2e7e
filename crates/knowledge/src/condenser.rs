//! Query condensing: rewrite a follow-up into a standalone question.

use crate::history::render_history;
use crate::types::ConversationTurn;
use docchat_core::AppResult;
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::{build_prompt, PromptSet, CHAT_HISTORY_VAR, QUESTION_VAR};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Turns a question plus conversation history into a standalone question.
pub struct QueryCondenser {
    client: Arc<dyn LlmClient>,
    model: String,
    prompts: Arc<PromptSet>,
}

impl QueryCondenser {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompts: Arc<PromptSet>) -> Self {
        Self {
            client,
            model: model.into(),
            prompts,
        }
    }

    /// Ask the model for a standalone version of `question`.
    ///
    /// Runs even when `turns` is empty; the model is then expected to hand
    /// the question back more or less unchanged. The reply is trimmed and
    /// otherwise used as-is.
    pub async fn condense(&self, question: &str, turns: &[ConversationTurn]) -> AppResult<String> {
        let mut variables = BTreeMap::new();
        variables.insert(CHAT_HISTORY_VAR.to_string(), render_history(turns));
        variables.insert(QUESTION_VAR.to_string(), question.to_string());

        let prompt = build_prompt(&self.prompts.condense, variables)?;

        tracing::debug!(turns = turns.len(), "Condense prompt:\n{}", prompt.text);

        let request = LlmRequest::new(prompt.text, &self.model).with_temperature(0.0);
        let response = self.client.complete(&request).await?;

        let standalone = response.content.trim().to_string();
        tracing::info!("Standalone question: {}", standalone);

        Ok(standalone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::normalize_history;
    use crate::tests::support::RecordingLlm;
    use docchat_core::AppError;

    #[tokio::test]
    async fn test_condense_sends_history_and_question() {
        let llm = RecordingLlm::replying(&["  What is the refund policy for digital goods?\n"]);
        let condenser = QueryCondenser::new(
            llm.clone(),
            "gpt-3.5-turbo",
            Arc::new(PromptSet::builtin().unwrap()),
        );
        let turns = normalize_history(&[
            "What is the refund policy?".to_string(),
            "Refunds are available within 30 days.".to_string(),
        ]);

        let standalone = condenser
            .condense("And for digital goods?", &turns)
            .await
            .unwrap();

        assert_eq!(standalone, "What is the refund policy for digital goods?");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].model, "gpt-3.5-turbo");
        assert!(requests[0].prompt.contains(
            "Chat History:\nHuman: What is the refund policy?\nAssistant: Refunds are available within 30 days.\nFollow Up Input: And for digital goods?"
        ));
    }

    #[tokio::test]
    async fn test_empty_history_still_calls_model() {
        let llm = RecordingLlm::replying(&["Who won?"]);
        let condenser =
            QueryCondenser::new(llm.clone(), "m", Arc::new(PromptSet::builtin().unwrap()));

        let standalone = condenser.condense("Who won?", &[]).await.unwrap();

        assert_eq!(standalone, "Who won?");
        assert_eq!(llm.requests().len(), 1);
        assert!(llm.requests()[0]
            .prompt
            .contains("Chat History:\n\nFollow Up Input: Who won?"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let llm = RecordingLlm::failing("rate limited");
        let condenser = QueryCondenser::new(llm, "m", Arc::new(PromptSet::builtin().unwrap()));

        let err = condenser.condense("Who won?", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
