//! Text-to-speech engines.

use crate::language::Language;
use async_trait::async_trait;
use docchat_core::config::{AppConfig, SynthesisSettings};
use docchat_core::{AppError, AppResult};
use serde::Serialize;
use std::collections::HashMap;

/// Trait for text-to-speech engines.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + std::fmt::Debug {
    /// Render `text` with the named voice. Returns encoded audio bytes.
    async fn synthesize(&self, text: &str, voice: &str) -> AppResult<Vec<u8>>;
}

/// Voice to use for each working language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTable {
    voices: HashMap<String, String>,
    default_voice: String,
}

impl VoiceTable {
    pub fn new(voices: HashMap<String, String>, default_voice: impl Into<String>) -> Self {
        Self {
            voices,
            default_voice: default_voice.into(),
        }
    }

    pub fn voice_for(&self, language: Language) -> &str {
        self.voices
            .get(language.code())
            .map(String::as_str)
            .unwrap_or(&self.default_voice)
    }
}

impl From<&SynthesisSettings> for VoiceTable {
    fn from(settings: &SynthesisSettings) -> Self {
        Self::new(settings.voices.clone(), settings.default_voice.clone())
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Client for OpenAI-compatible `/audio/speech` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpenAiSynthesizer {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> AppResult<Self> {
        let client = super::http_client(timeout_secs)
            .map_err(|e| AppError::Synthesis(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            timeout_secs,
        })
    }

    pub fn from_settings(settings: &SynthesisSettings) -> AppResult<Self> {
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
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> AppResult<Vec<u8>> {
        let url = format!("{}/audio/speech", self.base_url);
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: "mp3",
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Synthesis(format!("Failed to send speech request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Synthesis(format!(
                "Speech API error ({}): {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Synthesis(format!("Failed to read speech audio: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::Synthesis("Speech API returned no audio".to_string()));
        }

        Ok(bytes.to_vec())
    }
}
