//! Conversational question answering over the document index.
//!
//! One request runs sanitize, normalize, condense, retrieve, assemble,
//! generate and aggregate in that order. The first failing stage ends the
//! request and nothing is kept between requests, so one pipeline can serve
//! many tasks at once.

use crate::assembler::assemble_qa_prompt;
use crate::condenser::QueryCondenser;
use crate::embeddings::{self, EmbeddingConfig};
use crate::generator::AnswerGenerator;
use crate::history::normalize_entries;
use crate::question::{is_blank_question, sanitize_question};
use crate::retriever::Retriever;
use crate::types::{ChatReply, ChatRequest, HistoryEntry, PipelineResult};
use crate::vector_index::{self, VectorIndex};
use docchat_core::{AppConfig, AppError, AppResult};
use docchat_llm::{create_client, ClientSettings, LlmClient};
use docchat_prompt::PromptSet;
use std::sync::Arc;
use tracing::Instrument;

/// Message returned when a request carries no question.
pub const NO_QUESTION_MESSAGE: &str = "No question in the request";

/// The question answering pipeline.
pub struct ConversationalPipeline {
    prompts: Arc<PromptSet>,
    condenser: QueryCondenser,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl ConversationalPipeline {
    /// Build a pipeline from already constructed services.
    ///
    /// The same completion client and model serve both the condense and the
    /// answer step.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        embeddings: Arc<dyn embeddings::EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        prompts: Arc<PromptSet>,
    ) -> Self {
        let model = model.into();
        Self {
            condenser: QueryCondenser::new(Arc::clone(&llm), model.clone(), Arc::clone(&prompts)),
            retriever: Retriever::new(embeddings, index),
            generator: AnswerGenerator::new(llm, model),
            prompts,
        }
    }

    /// Fragments retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.retriever = self.retriever.with_top_k(top_k);
        self
    }

    /// Wire up providers, index and retry policy from configuration.
    ///
    /// # Errors
    /// `AppError::Config` if the index name is missing or a provider cannot
    /// be built. Nothing is sent upstream here.
    pub fn from_config(config: &AppConfig, prompts: &PromptSet) -> AppResult<Self> {
        let index_name = config.index_name()?;

        let llm = create_client(
            &config.provider,
            &ClientSettings::from_config(config, &config.provider),
        )?;
        let llm = docchat_llm::with_retry(llm, config.retry);

        let embedder =
            embeddings::create_provider(&EmbeddingConfig::from_app_config(config)?)?;
        let embedder = embeddings::with_retry(embedder, config.retry);

        let index = vector_index::create_index(config)?;
        let index = vector_index::with_retry(index, config.retry);

        tracing::info!(
            provider = %config.provider,
            model = %config.model,
            embeddings = embedder.provider_name(),
            index = index_name,
            top_k = config.retrieval.top_k,
            "Pipeline ready"
        );

        Ok(Self::new(
            llm,
            config.model.clone(),
            embedder,
            index,
            Arc::new(prompts.clone()),
        )
        .with_top_k(config.retrieval.top_k))
    }

    /// Answer `question` in the context of `history`.
    ///
    /// # Errors
    /// `AppError::Input` for a blank question (no stage runs); otherwise the
    /// error of the first stage that failed.
    pub async fn answer(
        &self,
        question: &str,
        history: &[HistoryEntry],
    ) -> AppResult<PipelineResult> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %request_id);

        async {
            let question = sanitize_question(question);
            if question.is_empty() {
                return Err(AppError::Input(NO_QUESTION_MESSAGE.to_string()));
            }

            let turns = normalize_entries(history);
            tracing::info!(turns = turns.len(), "Answering: {}", question);

            let standalone = self.condenser.condense(&question, &turns).await?;
            let fragments = self.retriever.retrieve(&standalone).await?;

            let assembled = assemble_qa_prompt(&self.prompts.qa, &standalone, &fragments)?;
            tracing::debug!("QA prompt:\n{}", assembled.prompt);

            let answer = self.generator.generate(&assembled.prompt).await?;
            tracing::info!(sources = fragments.len(), "Answer generated");

            Ok::<_, AppError>(PipelineResult::new(answer, fragments))
        }
        .instrument(span)
        .await
    }

    /// Serve one caller request, turning every outcome into a reply.
    pub async fn handle(&self, request: ChatRequest) -> ChatReply {
        let question = match request.question {
            Some(ref q) if !is_blank_question(Some(q.as_str())) => q,
            _ => {
                return ChatReply::NoQuestion {
                    message: NO_QUESTION_MESSAGE.to_string(),
                }
            }
        };

        match self.answer(question, &request.history).await {
            Ok(result) => ChatReply::Answer(result),
            Err(e) => {
                tracing::error!("Request failed: {}", e);
                ChatReply::Failure {
                    error: e.to_string(),
                }
            }
        }
    }
}
