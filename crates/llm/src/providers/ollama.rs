//! Ollama LLM provider implementation.
//!
//! This module provides integration with Ollama, a local LLM runtime.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use crate::providers::{error_for_status, http_client, line_stream};
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Ollama chat API request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat API response format. Streaming responses send one of these per line.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    #[serde(default)]
    message: Option<OllamaMessage>,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChatResponse {
    fn content(&self) -> &str {
        self.message.as_ref().map(|m| m.content.as_str()).unwrap_or("")
    }

    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: Option<u64>) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(timeout_secs)?,
        })
    }

    /// Convert LlmRequest to Ollama format.
    fn to_ollama_request(&self, request: &LlmRequest, stream: bool) -> OllamaChatRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaChatRequest {
            model: request.model.clone(),
            messages: request.messages(),
            stream,
            options,
        }
    }

    async fn send(&self, body: &OllamaChatRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        error_for_status("Ollama", response).await
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one NDJSON line of a streaming chat response.
fn parse_stream_line(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parsed = serde_json::from_str::<OllamaChatResponse>(line)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))
        .map(|response| {
            if response.done {
                let mut chunk = LlmStreamChunk::finished(response.model.clone(), Some(response.usage()));
                chunk.content = response.content().to_string();
                chunk
            } else {
                LlmStreamChunk::text(response.content(), response.model.clone())
            }
        });
    Some(parsed)
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_ollama_request(request, false)).await?;

        // For non-streaming, Ollama returns a single JSON object
        let ollama_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::info!("Received completion from Ollama");

        Ok(LlmResponse {
            content: ollama_response.content().to_string(),
            usage: ollama_response.usage(),
            model: ollama_response.model,
            done: ollama_response.done,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!(model = %request.model, "Starting streaming request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_ollama_request(request, true)).await?;

        let stream = line_stream(response.bytes_stream()).filter_map(|line| async move {
            match line {
                Ok(line) => parse_stream_line(&line),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::with_base_url("http://localhost:11434/");
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_ollama_request_conversion() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3")
            .with_system("Be brief")
            .with_temperature(0.7)
            .with_max_tokens(100);

        let ollama_req = client.to_ollama_request(&request, true);
        assert_eq!(ollama_req.model, "llama3");
        assert_eq!(ollama_req.messages.len(), 2);
        assert_eq!(ollama_req.messages[1].content, "Hello");
        assert!(ollama_req.stream);

        let options = ollama_req.options.unwrap();
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(options.num_predict, Some(100));
    }

    #[test]
    fn test_parse_stream_lines() {
        let chunk = parse_stream_line(
            r#"{"model":"llama3","message":{"role":"assistant","content":"Par"},"done":false}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(chunk.content, "Par");
        assert!(!chunk.done);

        let last = parse_stream_line(
            r#"{"model":"llama3","message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":12,"eval_count":3}"#,
        )
        .unwrap()
        .unwrap();
        assert!(last.done);
        assert_eq!(last.usage, Some(LlmUsage::new(12, 3)));

        assert!(parse_stream_line("   ").is_none());
        assert!(parse_stream_line("not json").unwrap().is_err());
    }
}
