//! Command handlers for the docchat CLI.

pub mod ask;
pub mod chat;

pub use ask::AskCommand;
pub use chat::ChatCommand;

use docchat_core::{config::AppConfig, AppResult};
use docchat_knowledge::{ConversationalPipeline, PipelineResult};
use docchat_prompt::load_prompt_set;

/// Build the pipeline once per process from the final configuration.
pub fn build_pipeline(config: &AppConfig) -> AppResult<ConversationalPipeline> {
    config.validate()?;
    let prompts = load_prompt_set(&config.prompts_dir())?;
    ConversationalPipeline::from_config(config, &prompts)
}

/// Plain-text rendering of an answer followed by its sources.
pub fn render_result(result: &PipelineResult) -> String {
    let mut out = result.answer.trim_end().to_string();

    if !result.source_documents.is_empty() {
        out.push_str("\n\nSources:");
        for (i, doc) in result.source_documents.iter().enumerate() {
            let label = doc
                .metadata
                .get("source")
                .and_then(|v| v.as_str())
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            let preview: String = doc.text.trim().chars().take(80).collect();
            out.push_str(&format!("\n  [{}]{} {}", i + 1, label, preview));
        }
    }

    out
}
