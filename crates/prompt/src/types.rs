//! Prompt types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A prompt template override loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Prompt identifier ("condense" or "qa")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// A fully rendered prompt ready for a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Rendered prompt text
    pub text: String,

    /// Metadata about the rendering
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source template ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were substituted
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: BTreeMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(
        text: String,
        source_prompt_id: String,
        resolved_variables: BTreeMap<String, String>,
    ) -> Self {
        Self {
            text,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}
