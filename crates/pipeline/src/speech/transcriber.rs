//! Speech-to-text engines.

use async_trait::async_trait;
use docchat_core::config::{AppConfig, TranscriptionSettings};
use docchat_core::{AppError, AppResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Text recognized from an audio clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    pub text: String,
    /// Language reported by the engine, in whatever form it uses
    pub detected_language: Option<String>,
}

/// Trait for speech-to-text engines.
///
/// Constructed once at startup and shared by every request.
#[async_trait]
pub trait Transcriber: Send + Sync + std::fmt::Debug {
    /// Transcribe an encoded audio clip of the given MIME type.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> AppResult<Transcription>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// Client for OpenAI-compatible `/audio/transcriptions` endpoints (Groq, OpenAI).
#[derive(Debug, Clone)]
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpenAiTranscriber {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> AppResult<Self> {
        let client = super::http_client(timeout_secs).map_err(|e| {
            AppError::Transcription(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            timeout_secs,
        })
    }

    /// Create a transcriber from settings, reading the API key from the environment.
    pub fn from_settings(settings: &TranscriptionSettings) -> AppResult<Self> {
        let api_key = AppConfig::resolve_api_key(settings.api_key_env.as_deref())?;
        Self::new(
            &settings.endpoint,
            &settings.model,
            api_key,
            settings.timeout_secs,
        )
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> AppResult<Transcription> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let file = Part::bytes(audio.to_vec())
            .file_name(format!("audio.{}", extension_for_mime(mime_type)))
            .mime_str(mime_type)
            .map_err(|e| AppError::Transcription(format!("Invalid MIME type {}: {}", mime_type, e)))?;

        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let mut request = self.client.post(&url).multipart(form);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to send audio: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Transcription(format!(
                "Transcription API error ({}): {}",
                status, body
            )));
        }

        let parsed: VerboseTranscription = response.json().await.map_err(|e| {
            AppError::Transcription(format!("Failed to parse transcription response: {}", e))
        })?;

        Ok(Transcription {
            text: parsed.text,
            detected_language: parsed.language,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// File extension the upload is named with; servers sniff format from it.
pub(crate) fn extension_for_mime(mime_type: &str) -> &'static str {
    let subtype = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches("audio/");

    match subtype {
        "mpeg" | "mp3" => "mp3",
        "mp4" | "m4a" | "x-m4a" => "m4a",
        "ogg" => "ogg",
        "webm" => "webm",
        "flac" | "x-flac" => "flac",
        _ => "wav",
    }
}
