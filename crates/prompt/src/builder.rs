//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders the system template (when present) and the user template with the
/// same variables. Output is not HTML-escaped.
///
/// # Example
/// ```no_run
/// use docchat_prompt::{build_prompt, default_answer_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("language".to_string(), "Hindi".to_string());
/// vars.insert("question".to_string(), "What is the refund policy?".to_string());
///
/// let built = build_prompt(&default_answer_prompt(), vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let system = match definition.system {
        Some(ref template) => Some(render_template(&mut handlebars, "system", template, &variables)?),
        None => None,
    };
    let user = render_template(&mut handlebars, "user", &definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(
    handlebars: &mut Handlebars<'_>,
    name: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render(name, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_build_system_and_user() {
        let def = definition(Some("Respond in {{language}}."), "Question: {{question}}");
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), "Tamil".to_string());
        vars.insert("question".to_string(), "Where is the office?".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.system.as_deref(), Some("Respond in Tamil."));
        assert_eq!(built.user, "Question: Where is the office?");
        assert_eq!(built.metadata.resolved_variables.len(), 2);
    }

    #[test]
    fn test_no_html_escaping() {
        let def = definition(None, "{{context}}");
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "a < b & \"c\"".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "a < b & \"c\"");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let built = build_prompt(&definition(None, "Q: {{missing}}"), HashMap::new()).unwrap();
        assert_eq!(built.user, "Q: ");
    }

    #[test]
    fn test_invalid_template_rejected() {
        let result = build_prompt(&definition(None, "{{#if ready}}unclosed"), HashMap::new());
        assert!(result.is_err());
    }
}
