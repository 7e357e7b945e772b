//! OpenAI-compatible chat completion provider.
//!
//! Works against any server implementing `/chat/completions` with bearer
//! authentication, including Groq (`https://api.groq.com/openai/v1`).
//! Streaming responses are server-sent events: `data: {json}` lines
//! terminated by `data: [DONE]`.

use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use crate::providers::{error_for_status, http_client, line_stream};
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible LLM client.
pub struct OpenAiClient {
    /// Provider name reported in logs ("groq", "openai")
    name: String,

    /// Base URL, e.g. https://api.groq.com/openai/v1
    base_url: String,

    /// Bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client for an OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http_client(timeout_secs)?,
        })
    }

    fn to_chat_request(&self, request: &LlmRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages(),
            stream,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    async fn send(&self, body: &ChatCompletionRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to {}: {}", self.name, e)))?;

        error_for_status(&self.name, response).await
    }
}

/// Parse one server-sent-events line of a streaming response.
///
/// Returns `None` for blank lines, comments and non-data fields.
fn parse_sse_line(line: &str, model: &str) -> Option<AppResult<LlmStreamChunk>> {
    let data = line.trim().strip_prefix("data:")?.trim();

    if data == "[DONE]" {
        return Some(Ok(LlmStreamChunk::finished(model, None)));
    }

    let parsed = serde_json::from_str::<ChatCompletionChunk>(data)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))
        .map(|chunk| {
            let content = chunk
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .collect::<String>();
            let model = if chunk.model.is_empty() {
                model.to_string()
            } else {
                chunk.model
            };
            let mut parsed = LlmStreamChunk::text(content, model);
            parsed.usage = chunk.usage;
            parsed
        });
    Some(parsed)
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(provider = %self.name, model = %request.model, "Sending completion request");
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_chat_request(request, false)).await?;

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm(format!("{} returned no choices", self.name)))?;

        tracing::info!(
            provider = %self.name,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "Received completion"
        );

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model: if completion.model.is_empty() {
                request.model.clone()
            } else {
                completion.model
            },
            usage: completion.usage.unwrap_or_default(),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!(provider = %self.name, model = %request.model, "Starting streaming request");
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_chat_request(request, true)).await?;
        let model = request.model.clone();

        let stream = line_stream(response.bytes_stream())
            .filter_map(move |line| {
                let model = model.clone();
                async move {
                    match line {
                        Ok(line) => parse_sse_line(&line, &model),
                        Err(e) => Some(Err(e)),
                    }
                }
            })
            .scan(false, |finished, item| {
                // Nothing after [DONE] is forwarded
                if *finished {
                    return futures::future::ready(None);
                }
                if let Ok(ref chunk) = item {
                    *finished = chunk.done;
                }
                futures::future::ready(Some(item))
            });

        Ok(Box::pin(stream))
    }
}
