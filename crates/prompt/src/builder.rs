//! Prompt builder: compiles Handlebars templates and renders them with variables.

use crate::template::PromptTemplate;
use crate::types::BuiltPrompt;
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::BTreeMap;

/// Build a prompt from a template and its variables.
///
/// Rendering is deterministic: the same template and variables always
/// produce the same text.
///
/// # Example
/// ```
/// use docchat_prompt::{build_prompt, PromptSet};
/// use std::collections::BTreeMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompts = PromptSet::builtin()?;
/// let mut vars = BTreeMap::new();
/// vars.insert("context".to_string(), "Refunds within 30 days.".to_string());
/// vars.insert("question".to_string(), "What is the refund policy?".to_string());
///
/// let built = build_prompt(&prompts.qa, vars)?;
/// assert!(built.text.contains("Question: What is the refund policy?"));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn build_prompt(
    template: &PromptTemplate,
    variables: BTreeMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", template.id());

    let text = template.render(&variables)?;

    Ok(BuiltPrompt::new(text, template.id().to_string(), variables))
}

/// Compile a template into a strict, non-escaping Handlebars registry.
///
/// Strict mode turns a reference to an unknown variable into a render error
/// instead of silently rendering an empty string.
pub(crate) fn compile_template(id: &str, template: &str) -> AppResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(id, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template '{}': {}", id, e)))?;

    Ok(handlebars)
}

/// Render a compiled template.
pub(crate) fn render_compiled(
    handlebars: &Handlebars<'static>,
    id: &str,
    variables: &BTreeMap<String, String>,
) -> AppResult<String> {
    handlebars
        .render(id, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let hb = compile_template("t", "Question: {{question}}").unwrap();
        let rendered = render_compiled(&hb, "t", &vars(&[("question", "Hello, world!")])).unwrap();
        assert_eq!(rendered, "Question: Hello, world!");
    }

    #[test]
    fn test_no_html_escaping() {
        let hb = compile_template("t", "{{context}}").unwrap();
        let rendered =
            render_compiled(&hb, "t", &vars(&[("context", "a < b && \"quoted\"")])).unwrap();
        assert_eq!(rendered, "a < b && \"quoted\"");
    }

    #[test]
    fn test_missing_variable_is_error() {
        let hb = compile_template("t", "Question: {{missing}}").unwrap();
        let err = render_compiled(&hb, "t", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
    }

    #[test]
    fn test_malformed_template_is_error() {
        assert!(compile_template("t", "{{#if}}unclosed").is_err());
    }

    #[test]
    fn test_build_prompt_records_variables() {
        let template = PromptTemplate::new("qa", "{{context}}|{{question}}", &["context", "question"])
            .unwrap();
        let built = build_prompt(&template, vars(&[("context", ""), ("question", "Why?")])).unwrap();

        assert_eq!(built.text, "|Why?");
        assert_eq!(built.metadata.source_prompt_id, "qa");
        assert_eq!(built.metadata.resolved_variables.len(), 2);
    }
}
