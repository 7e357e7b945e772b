//! Request-scoped pipeline types.

use crate::language::Language;
use docchat_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned with `success: true` when no index is available.
pub const BASIC_MODE_NOTICE: &str =
    "System is running in basic mode (no documents indexed). Please add documents to enable RAG.";

/// Caller-facing message for any upstream failure.
pub const PROCESSING_FAILURE_MESSAGE: &str = "Error processing request.";

/// How the question reached the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Audio,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

/// Raw caller input.
#[derive(Debug, Clone)]
pub enum RequestInput {
    Text(String),
    Audio {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl RequestInput {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::Text(_) => InputKind::Text,
            Self::Audio { .. } => InputKind::Audio,
        }
    }
}

/// One request entering the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub input: RequestInput,
    pub requested_language: Option<String>,
}

impl PipelineRequest {
    pub fn text(message: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            input: RequestInput::Text(message.into()),
            requested_language: language.map(str::to_string),
        }
    }

    pub fn audio(bytes: Vec<u8>, mime_type: Option<&str>, language: Option<&str>) -> Self {
        Self {
            input: RequestInput::Audio {
                bytes,
                mime_type: mime_type.map(str::to_string),
            },
            requested_language: language.map(str::to_string),
        }
    }
}

/// Output of the text or speech normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub text: String,
    pub kind: InputKind,
    /// Language reported by the transcription service, if any
    pub detected_language: Option<String>,
}

/// The question in its final form, with the working language fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedQuery {
    pub query_text: String,
    pub language: Language,
    pub input_kind: InputKind,
}

/// Outcome of retrieval and answer composition.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub refined_query: RefinedQuery,
    pub answer_text: String,
    pub retrieved_chunk_ids: Vec<String>,
    /// True when the answer is the "no information" fallback phrase
    pub fallback_used: bool,
}

/// Uniform response for both entry flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub response: String,
    pub language: String,
    pub source: InputKind,
    pub query: String,

    /// Transcribed question (audio flow only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,

    /// Base64-encoded synthesized answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_payload: Option<String>,
}

impl ResponseEnvelope {
    pub fn answered(query: &RefinedQuery, response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
            language: query.language.code().to_string(),
            source: query.input_kind,
            query: query.query_text.clone(),
            transcription: None,
            audio_payload: None,
        }
    }
}

/// Why a request did not produce an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineFailure {
    /// The caller's input was rejected.
    #[error("{message}")]
    Validation { message: String },

    /// An upstream service or the system failed.
    #[error("{message}")]
    Processing { message: String },
}

impl PipelineFailure {
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message } | Self::Processing { message } => message,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Translate a lower-layer error for a request flow.
    ///
    /// Validation errors keep their message. Everything else is logged and
    /// reported with the generic processing message.
    pub fn from_request_error(err: AppError) -> Self {
        match err {
            AppError::Validation(message) => Self::Validation { message },
            other => {
                tracing::error!("Request failed: {}", other);
                Self::Processing {
                    message: PROCESSING_FAILURE_MESSAGE.to_string(),
                }
            }
        }
    }
}
