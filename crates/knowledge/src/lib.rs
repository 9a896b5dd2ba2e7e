//! Retrieval-augmented conversational question answering.
//!
//! Answers a follow-up question against a document index: the question is
//! rewritten into a standalone form using the conversation so far, the
//! closest fragments are retrieved, and the model answers from those
//! fragments alone.
//!
//! # Example
//! ```no_run
//! use docchat_core::AppConfig;
//! use docchat_knowledge::{ConversationalPipeline, HistoryEntry};
//! use docchat_prompt::PromptSet;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let pipeline = ConversationalPipeline::from_config(&config, &PromptSet::builtin()?)?;
//!
//! let history = vec![
//!     HistoryEntry::from("What is the refund policy?"),
//!     HistoryEntry::from("Refunds are available within 30 days."),
//! ];
//! let result = pipeline.answer("And for digital goods?", &history).await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod condenser;
pub mod embeddings;
pub mod generator;
pub mod history;
pub mod pinecone_index;
pub mod pipeline;
pub mod question;
pub mod retriever;
pub mod sqlite_index;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use assembler::{assemble_qa_prompt, build_context, AssembledPrompt};
pub use condenser::QueryCondenser;
pub use embeddings::{EmbeddingConfig, EmbeddingProvider};
pub use generator::AnswerGenerator;
pub use history::{normalize_entries, normalize_history, render_history};
pub use pinecone_index::PineconeIndex;
pub use pipeline::{ConversationalPipeline, NO_QUESTION_MESSAGE};
pub use question::{is_blank_question, sanitize_question};
pub use retriever::Retriever;
pub use sqlite_index::SqliteIndex;
pub use types::{
    ChatReply, ChatRequest, ConversationTurn, DocumentFragment, HistoryEntry, PipelineResult,
    Role, ScoredFragment,
};
pub use vector_index::VectorIndex;
