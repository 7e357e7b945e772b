//! Prompt types for docchat.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition loaded from YAML (or the built-in default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// System instruction template (Handlebars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,
}

impl PromptDefinition {
    /// Whether `name` is referenced as `{{name}}` by the system or user template.
    pub fn references(&self, name: &str) -> bool {
        let placeholder = format!("{{{{{}}}}}", name);
        self.template.contains(&placeholder)
            || self
                .system
                .as_deref()
                .is_some_and(|system| system.contains(&placeholder))
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: answer.grounded
title: Grounded answer
apiVersion: "1.0"
createdBy: test
system: "Respond in {{language}}."
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "answer.grounded");
        assert_eq!(def.system.as_deref(), Some("Respond in {{language}}."));
        assert!(def.references("language"));
        assert!(def.references("question"));
        assert!(!def.references("context"));
    }

    #[test]
    fn test_built_prompt_creation() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "test".to_string());

        let built = BuiltPrompt::new(
            Some("System message".to_string()),
            "User message".to_string(),
            "answer.grounded".to_string(),
            vars,
        );

        assert_eq!(built.system, Some("System message".to_string()));
        assert_eq!(built.user, "User message");
        assert_eq!(built.metadata.source_prompt_id, "answer.grounded");
    }
}
