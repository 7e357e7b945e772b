//! LLM integration crate for docchat.
//!
//! This crate provides a provider-agnostic abstraction for chat completion
//! services, with one-shot and streaming calls behind a single trait.
//!
//! # Providers
//! - **Groq** (default) and any other OpenAI-compatible API
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use docchat_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
