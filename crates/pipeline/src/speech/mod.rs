//! Speech input and output.
//!
//! [`SpeechNormalizer`] turns uploaded audio into question text using a
//! shared [`Transcriber`]. Answers can be voiced through an optional
//! [`SpeechSynthesizer`].

pub mod synthesizer;
pub mod transcriber;

pub use synthesizer::{OpenAiSynthesizer, SpeechSynthesizer, VoiceTable};
pub use transcriber::{OpenAiTranscriber, Transcriber, Transcription};

use crate::types::{InputKind, NormalizedInput};
use docchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// MIME type assumed when the caller's is missing or not an audio type.
pub const DEFAULT_AUDIO_MIME: &str = "audio/wav";

/// HTTP client for the speech services, with an optional request timeout.
pub(crate) fn http_client(timeout_secs: Option<u64>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

#[derive(Debug, Clone)]
pub struct SpeechNormalizer {
    transcriber: Arc<dyn Transcriber>,
}

impl SpeechNormalizer {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }

    /// Transcribe an audio clip into question text.
    ///
    /// Empty audio and empty transcriptions are validation errors; engine
    /// failures are transcription errors.
    pub async fn normalize(&self, audio: &[u8], mime_type: Option<&str>) -> AppResult<NormalizedInput> {
        if audio.is_empty() {
            return Err(AppError::Validation("Empty audio input".to_string()));
        }

        let mime_type = effective_mime(mime_type);
        tracing::debug!(
            bytes = audio.len(),
            mime_type,
            model = self.transcriber.model_name(),
            "Transcribing audio"
        );

        let transcription = self.transcriber.transcribe(audio, mime_type).await?;
        let text = transcription.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Empty transcription".to_string()));
        }

        if let Some(ref language) = transcription.detected_language {
            tracing::info!("Transcription language reported as {}", language);
        }

        Ok(NormalizedInput {
            text: text.to_string(),
            kind: InputKind::Audio,
            detected_language: transcription.detected_language,
        })
    }
}

fn effective_mime(mime_type: Option<&str>) -> &str {
    match mime_type {
        Some(mime) if mime.starts_with("audio/") => mime,
        _ => DEFAULT_AUDIO_MIME,
    }
}
