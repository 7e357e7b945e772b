//! Request orchestration for the text and audio flows.
//!
//! ```text
//! text:  normalize text -> resolve language -> retrieve -> compose -> envelope
//! audio: transcribe     -> resolve language -> retrieve -> compose -> envelope
//! ```
//!
//! The orchestrator is the only place lower-layer errors become
//! [`PipelineFailure`]s.

use crate::components::PipelineComponents;
use crate::composer::is_fallback_answer;
use crate::events::{EventStream, PipelineEvent};
use crate::language::Language;
use crate::text::normalize_text;
use crate::types::{
    NormalizedInput, PipelineFailure, PipelineRequest, RefinedQuery, RequestInput,
    ResponseEnvelope, RetrievalResult, BASIC_MODE_NOTICE, PROCESSING_FAILURE_MESSAGE,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docchat_core::AppResult;
use docchat_knowledge::{IndexStats, IndexStatus};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

/// Runs requests through the pipeline. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<PipelineComponents>,
}

fn request_span(flow: &str) -> tracing::Span {
    tracing::info_span!("request", request_id = %Uuid::new_v4(), flow)
}

impl PipelineOrchestrator {
    pub fn new(components: PipelineComponents) -> Self {
        Self {
            inner: Arc::new(components),
        }
    }

    /// Answer a typed question.
    pub async fn process_text(
        &self,
        message: &str,
        language: Option<&str>,
    ) -> Result<ResponseEnvelope, PipelineFailure> {
        async {
            let input = normalize_text(message).map_err(PipelineFailure::from_request_error)?;
            let query = self.refine(input, language);
            let result = self.answer(&query).await?;
            Ok::<_, PipelineFailure>(ResponseEnvelope::answered(&query, response_text(result)))
        }
        .instrument(request_span("text"))
        .await
    }

    /// Answer a spoken question.
    ///
    /// With `return_audio`, the answer is also voiced when a synthesizer is
    /// configured. Synthesis is best effort: failures leave `audio_payload`
    /// empty.
    pub async fn process_audio(
        &self,
        audio: &[u8],
        mime_type: Option<&str>,
        language: Option<&str>,
        return_audio: bool,
    ) -> Result<ResponseEnvelope, PipelineFailure> {
        async {
            let input = self
                .inner
                .speech
                .normalize(audio, mime_type)
                .await
                .map_err(PipelineFailure::from_request_error)?;
            let transcription = input.text.clone();
            let query = self.refine(input, language);
            let result = self.answer(&query).await?;

            let mut envelope = ResponseEnvelope::answered(&query, response_text(result));
            envelope.transcription = Some(transcription);
            if return_audio {
                envelope.audio_payload = self.synthesize(&envelope.response, query.language).await;
            }
            Ok::<_, PipelineFailure>(envelope)
        }
        .instrument(request_span("audio"))
        .await
    }

    /// Stream the answer to a typed question.
    pub fn process_text_stream(&self, message: impl Into<String>, language: Option<&str>) -> EventStream {
        self.spawn_stream(PipelineRequest::text(message, language))
    }

    /// Stream the answer to a spoken question.
    pub fn process_audio_stream(
        &self,
        audio: Vec<u8>,
        mime_type: Option<&str>,
        language: Option<&str>,
    ) -> EventStream {
        self.spawn_stream(PipelineRequest::audio(audio, mime_type, language))
    }

    /// Rebuild the index from the documents folder.
    ///
    /// On failure the previous index keeps serving and the failure carries
    /// the specific reason.
    pub async fn rebuild_index(&self) -> Result<IndexStats, PipelineFailure> {
        self.inner.store.rebuild().await.map_err(|e| {
            tracing::error!("Index rebuild failed: {}", e);
            PipelineFailure::Processing {
                message: e.to_string(),
            }
        })
    }

    pub async fn index_status(&self) -> IndexStatus {
        self.inner.store.status().await
    }

    fn refine(&self, input: NormalizedInput, requested: Option<&str>) -> RefinedQuery {
        let language = self.inner.resolver.resolve(&input.text, requested);
        tracing::info!(
            language = language.code(),
            source = input.kind.as_str(),
            "Resolved working language"
        );

        RefinedQuery {
            query_text: input.text,
            language,
            input_kind: input.kind,
        }
    }

    /// Retrieve and compose. `None` means no index is being served.
    async fn answer(&self, query: &RefinedQuery) -> Result<Option<RetrievalResult>, PipelineFailure> {
        let Some(index) = self.inner.store.current().await else {
            tracing::info!("No index available, answering in basic mode");
            return Ok(None);
        };

        let chunks = self
            .inner
            .retriever
            .retrieve(&index, &query.query_text, self.inner.top_k)
            .await
            .map_err(PipelineFailure::from_request_error)?;

        let answer_text = self
            .inner
            .composer
            .compose(query, &chunks)
            .await
            .map_err(PipelineFailure::from_request_error)?;

        let fallback_used = is_fallback_answer(&answer_text);
        if fallback_used {
            tracing::info!("No relevant information in documents");
        }

        Ok(Some(RetrievalResult {
            refined_query: query.clone(),
            answer_text,
            retrieved_chunk_ids: chunks.into_iter().map(|c| c.id).collect(),
            fallback_used,
        }))
    }

    async fn synthesize(&self, text: &str, language: Language) -> Option<String> {
        let Some(ref synthesis) = self.inner.synthesis else {
            tracing::debug!("Speech synthesis not configured");
            return None;
        };

        let voice = synthesis.voices.voice_for(language);
        match synthesis.synthesizer.synthesize(text, voice).await {
            Ok(audio) => Some(STANDARD.encode(audio)),
            Err(e) => {
                tracing::warn!("Speech synthesis failed, returning text only: {}", e);
                None
            }
        }
    }

    async fn normalize(&self, input: &RequestInput) -> AppResult<NormalizedInput> {
        match input {
            RequestInput::Text(message) => normalize_text(message),
            RequestInput::Audio { bytes, mime_type } => {
                self.inner.speech.normalize(bytes, mime_type.as_deref()).await
            }
        }
    }

    fn spawn_stream(&self, request: PipelineRequest) -> EventStream {
        let (tx, stream) = EventStream::channel();
        let span = request_span(request.input.kind().as_str());
        let orchestrator = self.clone();

        tokio::spawn(async move { orchestrator.run_stream(request, tx).await }.instrument(span));

        stream
    }

    /// Produce the events of one streamed request. Sends exactly one terminal
    /// event unless the consumer has gone away.
    async fn run_stream(self, request: PipelineRequest, tx: mpsc::Sender<PipelineEvent>) {
        let input = match self.normalize(&request.input).await {
            Ok(input) => input,
            Err(e) => {
                let failure = PipelineFailure::from_request_error(e);
                let _ = tx.send(PipelineEvent::Error(failure.message().to_string())).await;
                return;
            }
        };

        let query = self.refine(input, request.requested_language.as_deref());
        if tx
            .send(PipelineEvent::Language(query.language.code().to_string()))
            .await
            .is_err()
        {
            return;
        }

        let Some(index) = self.inner.store.current().await else {
            tracing::info!("No index available, answering in basic mode");
            if tx.send(PipelineEvent::Content(BASIC_MODE_NOTICE.to_string())).await.is_ok() {
                let _ = tx.send(PipelineEvent::Done(BASIC_MODE_NOTICE.to_string())).await;
            }
            return;
        };

        let setup = async {
            let chunks = self
                .inner
                .retriever
                .retrieve(&index, &query.query_text, self.inner.top_k)
                .await?;
            self.inner.composer.compose_stream(&query, &chunks).await
        };

        let mut fragments = tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("Stream consumer went away before generation started");
                return;
            }
            setup = setup => match setup {
                Ok(fragments) => fragments,
                Err(e) => {
                    send_failure(&tx, e).await;
                    return;
                }
            },
        };

        let mut answer = String::new();
        loop {
            tokio::select! {
                _ = tx.closed() => {
                    tracing::debug!("Stream consumer went away, abandoning generation");
                    return;
                }
                next = fragments.next() => match next {
                    Some(Ok(fragment)) => {
                        answer.push_str(&fragment);
                        if tx.send(PipelineEvent::Content(fragment)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        send_failure(&tx, e).await;
                        return;
                    }
                    None => break,
                },
            }
        }

        if answer.trim().is_empty() {
            tracing::error!("Generation stream produced no text");
            let _ = tx
                .send(PipelineEvent::Error(PROCESSING_FAILURE_MESSAGE.to_string()))
                .await;
            return;
        }

        let answer = answer.trim().to_string();
        if is_fallback_answer(&answer) {
            tracing::info!("No relevant information in documents");
        }
        let _ = tx.send(PipelineEvent::Done(answer)).await;
    }
}

fn response_text(result: Option<RetrievalResult>) -> String {
    match result {
        Some(result) => result.answer_text,
        None => BASIC_MODE_NOTICE.to_string(),
    }
}

async fn send_failure(tx: &mpsc::Sender<PipelineEvent>, err: docchat_core::AppError) {
    let failure = PipelineFailure::from_request_error(err);
    let _ = tx.send(PipelineEvent::Error(failure.message().to_string())).await;
}
