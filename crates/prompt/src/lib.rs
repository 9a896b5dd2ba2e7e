//! Prompt templates for docchat.
//!
//! This crate owns the two templates the pipeline renders:
//! - the condense template, which rewrites a follow-up into a standalone question
//! - the QA template, which grounds the answer in retrieved context
//!
//! Templates use Handlebars placeholders (`{{chat_history}}`, `{{question}}`,
//! `{{context}}`), are compiled once into a [`PromptSet`] at startup and are
//! never mutated afterwards. Workspaces may override either template with a
//! YAML definition under `.docchat/prompts/`.

pub mod builder;
pub mod loader;
pub mod template;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, load_prompt_set};
pub use template::{
    PromptSet, PromptTemplate, CHAT_HISTORY_VAR, CONDENSE_TEMPLATE, CONDENSE_TEMPLATE_ID,
    CONTEXT_VAR, QA_TEMPLATE, QA_TEMPLATE_ID, QUESTION_VAR,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
