//! Grounded answer composition.
//!
//! Renders the answer prompt from the refined query and the retrieved
//! passages, then calls the generation service one-shot or streaming.

use crate::types::RefinedQuery;
use docchat_core::config::GenerationSettings;
use docchat_core::{AppError, AppResult};
use docchat_knowledge::RetrievedChunk;
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::{build_prompt, resolve_answer_prompt, PromptDefinition};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// The exact phrase the model is told to use when the context has no answer.
pub const FALLBACK_PHRASE: &str = "Information not available in internal documents.";

/// Separator between numbered passages in the rendered context.
const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Incremental answer text, in generation order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

/// Whether an answer is the "no information" fallback.
pub fn is_fallback_answer(answer: &str) -> bool {
    answer.trim() == FALLBACK_PHRASE
}

/// Render retrieved chunks as numbered passages.
pub fn render_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk.text.trim()))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

/// Builds grounded prompts and invokes the generation service.
#[derive(Clone)]
pub struct AnswerComposer {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for AnswerComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerComposer")
            .field("provider", &self.llm.provider_name())
            .field("prompt", &self.prompt.id)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AnswerComposer {
    pub fn new(llm: Arc<dyn LlmClient>, prompt: PromptDefinition, model: impl Into<String>) -> Self {
        Self {
            llm,
            prompt,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Create a composer from generation settings, loading any prompt
    /// override from `prompts_dir`.
    pub fn from_settings(
        llm: Arc<dyn LlmClient>,
        settings: &GenerationSettings,
        prompts_dir: Option<&Path>,
    ) -> AppResult<Self> {
        let prompt = resolve_answer_prompt(prompts_dir)?;
        let mut composer = Self::new(llm, prompt, &settings.model).with_temperature(settings.temperature);
        composer.max_tokens = settings.max_tokens;
        Ok(composer)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build the generation request for a query and its passages.
    ///
    /// An empty `chunks` slice still produces a request, with empty context.
    pub fn build_request(&self, query: &RefinedQuery, chunks: &[RetrievedChunk]) -> AppResult<LlmRequest> {
        let mut variables = HashMap::new();
        variables.insert("language".to_string(), query.language.display_name().to_string());
        variables.insert("fallback".to_string(), FALLBACK_PHRASE.to_string());
        variables.insert("context".to_string(), render_context(chunks));
        variables.insert("question".to_string(), query.query_text.clone());

        let built = build_prompt(&self.prompt, variables)?;

        let mut request =
            LlmRequest::new(built.user, &self.model).with_temperature(self.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        Ok(request)
    }

    /// Generate the full answer in one call.
    pub async fn compose(&self, query: &RefinedQuery, chunks: &[RetrievedChunk]) -> AppResult<String> {
        let request = self.build_request(query, chunks)?;
        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %self.model,
            passages = chunks.len(),
            "Generating answer"
        );

        let response = self.llm.complete(&request).await?;
        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(AppError::Llm("Generation returned an empty answer".to_string()));
        }

        Ok(answer.to_string())
    }

    /// Generate the answer as a stream of text fragments.
    ///
    /// Dropping the returned stream abandons the upstream request.
    pub async fn compose_stream(
        &self,
        query: &RefinedQuery,
        chunks: &[RetrievedChunk],
    ) -> AppResult<FragmentStream> {
        let request = self.build_request(query, chunks)?.with_streaming();
        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %self.model,
            passages = chunks.len(),
            "Streaming answer"
        );

        let stream = self.llm.stream(&request).await?;
        let fragments = stream.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) if chunk.content.is_empty() => None,
                Ok(chunk) => Some(Ok(chunk.content)),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(fragments))
    }
}
