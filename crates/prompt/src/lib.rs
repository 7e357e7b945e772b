//! Prompt system for docchat.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions with system and user templates
//! - Handlebars template rendering
//! - A built-in grounded answer prompt with validated overrides

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    default_answer_prompt, load_prompt, require_placeholders,
    resolve_answer_prompt, ANSWER_PLACEHOLDERS, ANSWER_PROMPT_ID,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
