//! Error types for docchat.
//!
//! A single error enum covers every failure category raised by the lower
//! layers: configuration, I/O, generation, knowledge indexing and retrieval,
//! prompts, input validation and the speech services. The pipeline
//! orchestrator is the only place that turns these into caller-facing results.

use thiserror::Error;

/// Unified error type for docchat.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (including missing credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation service errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Indexing, embedding and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt definition and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Caller input that failed validation (empty text, empty audio, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Speech-to-text errors
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Text-to-speech errors
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error was caused by the caller's input rather than by
    /// an upstream service or the system itself.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
