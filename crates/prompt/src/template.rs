//! Compiled prompt templates and the built-in template constants.

use crate::builder::{compile_template, render_compiled};
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::BTreeMap;

pub const CHAT_HISTORY_VAR: &str = "chat_history";
pub const QUESTION_VAR: &str = "question";
pub const CONTEXT_VAR: &str = "context";

pub const CONDENSE_TEMPLATE_ID: &str = "condense";
pub const QA_TEMPLATE_ID: &str = "qa";

/// Rewrites a follow-up into a standalone question.
pub const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.

Chat History:
{{chat_history}}
Follow Up Input: {{question}}
Standalone question:";

/// Answers a question from retrieved context only.
pub const QA_TEMPLATE: &str = "You are a helpful AI assistant. Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say you don't know. DO NOT try to make up an answer.
If the question is not related to the context, politely respond that you are tuned to only answer questions that are related to the context.

{{context}}

Question: {{question}}
Helpful answer in markdown:";

const KNOWN_VARS: [&str; 3] = [CHAT_HISTORY_VAR, QUESTION_VAR, CONTEXT_VAR];

/// A compiled, immutable prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    id: String,
    source: String,
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile `source` and check that every `required` placeholder is used.
    pub fn new(id: impl Into<String>, source: impl Into<String>, required: &[&str]) -> AppResult<Self> {
        let id = id.into();
        let source = source.into();
        let registry = compile_template(&id, &source)?;

        let template = Self {
            id,
            source,
            registry,
        };
        template.check_placeholders(required)?;

        Ok(template)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the given variables.
    pub fn render(&self, variables: &BTreeMap<String, String>) -> AppResult<String> {
        render_compiled(&self.registry, &self.id, variables)
    }

    /// Render once with sentinel values and look for each required sentinel.
    fn check_placeholders(&self, required: &[&str]) -> AppResult<()> {
        let sentinel = |name: &str| format!("\u{1}{}\u{1}", name);
        let probe: BTreeMap<String, String> = KNOWN_VARS
            .iter()
            .map(|name| (name.to_string(), sentinel(name)))
            .collect();

        let rendered = self.render(&probe).map_err(|e| {
            AppError::Prompt(format!(
                "Template '{}' uses an unknown placeholder (allowed: {}): {}",
                self.id,
                KNOWN_VARS.join(", "),
                e
            ))
        })?;

        for name in required {
            if !rendered.contains(&sentinel(name)) {
                return Err(AppError::Prompt(format!(
                    "Template '{}' is missing required placeholder {{{{{}}}}}",
                    self.id, name
                )));
            }
        }

        Ok(())
    }
}

/// The two templates used by the pipeline, built once at startup.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub condense: PromptTemplate,
    pub qa: PromptTemplate,
}

impl PromptSet {
    /// The built-in condense and QA templates.
    pub fn builtin() -> AppResult<Self> {
        Ok(Self {
            condense: Self::condense_template(CONDENSE_TEMPLATE)?,
            qa: Self::qa_template(QA_TEMPLATE)?,
        })
    }

    pub(crate) fn condense_template(source: &str) -> AppResult<PromptTemplate> {
        PromptTemplate::new(
            CONDENSE_TEMPLATE_ID,
            source,
            &[CHAT_HISTORY_VAR, QUESTION_VAR],
        )
    }

    pub(crate) fn qa_template(source: &str) -> AppResult<PromptTemplate> {
        PromptTemplate::new(QA_TEMPLATE_ID, source, &[CONTEXT_VAR, QUESTION_VAR])
    }
}
