//! Prompt assembly for the answering step.

use crate::types::DocumentFragment;
use docchat_core::AppResult;
use docchat_prompt::{build_prompt, PromptTemplate, CONTEXT_VAR, QUESTION_VAR};
use std::collections::BTreeMap;

/// The rendered QA prompt and the context block that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub prompt: String,
    pub context: String,
}

/// Join fragment texts in retrieval order, separated by a blank line.
///
/// Metadata is left out. No fragments gives an empty string.
pub fn build_context(fragments: &[DocumentFragment]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the QA template with the context block and standalone question.
pub fn assemble_qa_prompt(
    template: &PromptTemplate,
    standalone: &str,
    fragments: &[DocumentFragment],
) -> AppResult<AssembledPrompt> {
    let context = build_context(fragments);

    let mut variables = BTreeMap::new();
    variables.insert(CONTEXT_VAR.to_string(), context.clone());
    variables.insert(QUESTION_VAR.to_string(), standalone.to_string());

    let built = build_prompt(template, variables)?;

    Ok(AssembledPrompt {
        prompt: built.text,
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_prompt::PromptSet;
    use serde_json::json;

    #[test]
    fn test_context_joins_with_blank_line() {
        let fragments = vec![
            DocumentFragment::new("Refunds within 30 days."),
            DocumentFragment::new("Digital goods are final sale.")
                .with_metadata("source", json!("terms.pdf")),
        ];

        assert_eq!(
            build_context(&fragments),
            "Refunds within 30 days.\n\nDigital goods are final sale."
        );
    }

    #[test]
    fn test_no_fragments_gives_empty_context() {
        let prompts = PromptSet::builtin().unwrap();
        let assembled = assemble_qa_prompt(&prompts.qa, "Who won?", &[]).unwrap();

        assert_eq!(assembled.context, "");
        assert!(assembled.prompt.contains("just say you don't know"));
        assert!(assembled.prompt.contains("Question: Who won?"));
    }

    #[test]
    fn test_metadata_stays_out_of_prompt() {
        let prompts = PromptSet::builtin().unwrap();
        let fragments = vec![DocumentFragment::new("Refunds within 30 days.")
            .with_metadata("source", json!("secret-path/policy.pdf"))];

        let assembled = assemble_qa_prompt(&prompts.qa, "Refunds?", &fragments).unwrap();
        assert!(assembled.prompt.contains("Refunds within 30 days."));
        assert!(!assembled.prompt.contains("secret-path"));
    }

    #[test]
    fn test_identical_inputs_identical_prompts() {
        let prompts = PromptSet::builtin().unwrap();
        let fragments = vec![
            DocumentFragment::new("a"),
            DocumentFragment::new("b"),
        ];

        let first = assemble_qa_prompt(&prompts.qa, "q", &fragments).unwrap();
        let second = assemble_qa_prompt(&prompts.qa, "q", &fragments).unwrap();
        assert_eq!(first, second);
    }
}
