//! Prompt loader for YAML template overrides.

use crate::template::{PromptSet, CONDENSE_TEMPLATE_ID, QA_TEMPLATE_ID};
use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition by ID from a prompts directory.
///
/// Looks for `<id>.yml` inside `prompts_dir`.
///
/// # Example
/// ```no_run
/// use docchat_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".docchat/prompts"), "qa")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition, prompt_id)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all prompt IDs defined in a prompts directory.
pub fn list_prompts(prompts_dir: &Path) -> AppResult<Vec<String>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Build the prompt set, replacing built-ins with any overrides in `prompts_dir`.
pub fn load_prompt_set(prompts_dir: &Path) -> AppResult<PromptSet> {
    let mut prompts = PromptSet::builtin()?;
    let available = list_prompts(prompts_dir)?;

    if available.iter().any(|id| id == CONDENSE_TEMPLATE_ID) {
        let definition = load_prompt(prompts_dir, CONDENSE_TEMPLATE_ID)?;
        prompts.condense = PromptSet::condense_template(&definition.template)?;
        tracing::info!("Using condense template override '{}'", definition.title);
    }

    if available.iter().any(|id| id == QA_TEMPLATE_ID) {
        let definition = load_prompt(prompts_dir, QA_TEMPLATE_ID)?;
        prompts.qa = PromptSet::qa_template(&definition.template)?;
        tracing::info!("Using QA template override '{}'", definition.title);
    }

    Ok(prompts)
}

fn validate_prompt(def: &PromptDefinition, expected_id: &str) -> AppResult<()> {
    if def.id != expected_id {
        return Err(AppError::Prompt(format!(
            "Prompt id '{}' does not match file name '{}.yml'",
            def.id, expected_id
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
