//! LLM client abstraction and request/response types.
//!
//! This module defines the core abstractions for interacting with chat
//! completion providers.

use futures::Stream;
use docchat_core::AppResult;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A single chat message sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,

    /// Message text
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The user message
    pub prompt: String,

    /// Model identifier (e.g., "llama-3.3-70b-versatile", "llama3.2")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Enable streaming responses
    #[serde(default)]
    pub stream: bool,

    /// System instruction (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            stream: false,
            system: None,
        }
    }

    /// Enable streaming for this request.
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// The conversation as chat messages: the system instruction (if any)
    /// followed by the user message.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(self.prompt.clone()));
        messages
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,

    /// Whether the response was complete
    #[serde(default = "default_true")]
    pub done: bool,
}

fn default_true() -> bool {
    true
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A chunk from a streaming LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Model generating the stream
    pub model: String,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage statistics (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

impl LlmStreamChunk {
    /// A content fragment.
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            done: false,
            usage: None,
        }
    }

    /// The end-of-stream marker.
    pub fn finished(model: impl Into<String>, usage: Option<LlmUsage>) -> Self {
        Self {
            content: String::new(),
            model: model.into(),
            done: true,
            usage,
        }
    }
}

/// Stream of LLM chunks.
pub type LlmStream = Pin<Box<dyn Stream<Item = AppResult<LlmStreamChunk>> + Send>>;

/// Trait for LLM providers.
///
/// This trait abstracts the underlying provider (Groq, OpenAI, Ollama, ...)
/// and provides a unified interface for completion and streaming.
/// Dropping an `LlmStream` abandons the in-flight request.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "groq").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Perform a streaming completion.
    ///
    /// # Arguments
    /// * `request` - The completion request (streaming is forced on)
    ///
    /// # Returns
    /// A stream of response chunks
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_put_system_first() {
        let request = LlmRequest::new("What is the capital?", "model").with_system("Answer briefly");
        let messages = request.messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("Answer briefly"));
        assert_eq!(messages[1], ChatMessage::user("What is the capital?"));
    }

    #[test]
    fn test_messages_without_system() {
        let messages = LlmRequest::new("Hi", "model").messages();
        assert_eq!(messages, vec![ChatMessage::user("Hi")]);
    }
}
