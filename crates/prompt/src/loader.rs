//! Prompt loader for YAML prompt definitions.
//!
//! The answer prompt ships built in. A file named `<id>.yml` in the configured
//! prompts directory replaces it, provided it still references every
//! placeholder the composer fills in.

use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the grounded answer prompt.
pub const ANSWER_PROMPT_ID: &str = "answer.grounded";

/// Placeholders the answer prompt must reference.
pub const ANSWER_PLACEHOLDERS: [&str; 4] = ["language", "fallback", "context", "question"];

const DEFAULT_ANSWER_SYSTEM: &str = "You are a helpful AI assistant. Use the context to answer.
IMPORTANT:
1. Answer ONLY based on the context.
2. If the information is missing, say exactly: \"{{fallback}}\"
3. Respond in {{language}}.";

const DEFAULT_ANSWER_TEMPLATE: &str = "Context:
{{context}}

Question: {{question}}";

/// The built-in grounded answer prompt.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Grounded multilingual answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "docchat".to_string(),
        system: Some(DEFAULT_ANSWER_SYSTEM.to_string()),
        template: DEFAULT_ANSWER_TEMPLATE.to_string(),
    }
}

/// Resolve the answer prompt: the override in `prompts_dir` if one exists,
/// otherwise the built-in default.
pub fn resolve_answer_prompt(prompts_dir: Option<&Path>) -> AppResult<PromptDefinition> {
    let Some(dir) = prompts_dir else {
        return Ok(default_answer_prompt());
    };

    if !dir.join(format!("{}.yml", ANSWER_PROMPT_ID)).exists() {
        tracing::debug!("No answer prompt override in {:?}, using built-in", dir);
        return Ok(default_answer_prompt());
    }

    let definition = load_prompt(dir, ANSWER_PROMPT_ID)?;
    require_placeholders(&definition, &ANSWER_PLACEHOLDERS)?;
    Ok(definition)
}

/// Load a prompt definition by ID from a prompts directory.
///
/// # Arguments
/// * `prompts_dir` - Directory holding `<id>.yml` files
/// * `prompt_id` - Prompt identifier (e.g., "answer.grounded")
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

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Fail unless every name in `required` is referenced by the definition.
pub fn require_placeholders(def: &PromptDefinition, required: &[&str]) -> AppResult<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !def.references(name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Prompt(format!(
            "Prompt {} is missing placeholders: {}",
            def.id,
            missing.join(", ")
        )))
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Simple x.y check
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
