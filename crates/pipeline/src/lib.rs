//! Multilingual retrieval-augmented question answering.
//!
//! Requests arrive as text or audio, are normalized, assigned a working
//! language (en, hi, ta or te), answered from the indexed document corpus
//! and returned as a [`ResponseEnvelope`] or as a stream of
//! [`PipelineEvent`]s.

pub mod components;
pub mod composer;
pub mod events;
pub mod language;
pub mod orchestrator;
pub mod speech;
pub mod text;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use components::{PipelineComponents, Synthesis};
pub use composer::{is_fallback_answer, AnswerComposer, FALLBACK_PHRASE};
pub use events::{EventStream, PipelineEvent};
pub use language::{Language, LanguageDetector, LanguageResolver, ScriptDetector};
pub use orchestrator::PipelineOrchestrator;
pub use speech::{SpeechNormalizer, SpeechSynthesizer, Transcriber, Transcription, VoiceTable};
pub use types::{
    InputKind, PipelineFailure, ResponseEnvelope, BASIC_MODE_NOTICE, PROCESSING_FAILURE_MESSAGE,
};
