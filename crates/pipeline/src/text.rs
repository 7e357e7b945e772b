//! Text input normalization.

use crate::types::{InputKind, NormalizedInput};
use docchat_core::{AppError, AppResult};

/// Trim a typed question. Blank input is rejected.
pub fn normalize_text(raw: &str) -> AppResult<NormalizedInput> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Empty text input".to_string()));
    }

    tracing::debug!(
        original_length = raw.chars().count(),
        processed_length = text.chars().count(),
        "Normalized text input"
    );

    Ok(NormalizedInput {
        text: text.to_string(),
        kind: InputKind::Text,
        detected_language: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_whitespace() {
        let input = normalize_text("  What is RAG?\n").unwrap();
        assert_eq!(input.text, "What is RAG?");
        assert_eq!(input.kind, InputKind::Text);
    }

    #[test]
    fn test_blank_input_rejected() {
        for raw in ["", "   ", "\n\t"] {
            let err = normalize_text(raw).unwrap_err();
            assert!(err.is_validation(), "{:?} should be rejected", raw);
        }
    }
}
