//! Scripted collaborators and end-to-end pipeline scenarios.


use crate::components::{PipelineComponents, Synthesis};
use crate::composer::{AnswerComposer, FALLBACK_PHRASE};
use crate::orchestrator::PipelineOrchestrator;
use crate::speech::{SpeechNormalizer, SpeechSynthesizer, Transcriber, Transcription, VoiceTable};
use async_trait::async_trait;
use docchat_core::config::GenerationSettings;
use docchat_core::{AppError, AppResult};
use docchat_knowledge::embeddings::providers::trigram::TrigramProvider;
use docchat_knowledge::{ChunkingOptions, CorpusIndexer, IndexStore};
use docchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tempfile::TempDir;

pub(crate) const PARIS_ANSWER: &str = "Paris is the capital of France.";

/// How a [`ScriptedLlm`] replies.
enum Script {
    /// Always the same text
    Fixed(String),
    /// Answers the France question only when the context supports it
    Grounded,
    /// Every call fails
    Failing,
    /// Streams one fragment, then never finishes
    Hanging(String),
}

/// Generation double with a scripted reply.
pub(crate) struct ScriptedLlm {
    script: Script,
    calls: AtomicUsize,
    stream_dropped: Arc<AtomicBool>,
}

impl ScriptedLlm {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            stream_dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn answering(text: &str) -> Self {
        Self::with_script(Script::Fixed(text.to_string()))
    }

    pub(crate) fn grounded() -> Self {
        Self::with_script(Script::Grounded)
    }

    pub(crate) fn failing() -> Self {
        Self::with_script(Script::Failing)
    }

    pub(crate) fn hanging(first_fragment: &str) -> Self {
        Self::with_script(Script::Hanging(first_fragment.to_string()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }

    fn reply(&self, request: &LlmRequest) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Fixed(ref text) | Script::Hanging(ref text) => Ok(text.clone()),
            Script::Grounded => Ok(grounded_reply(request)),
            Script::Failing => Err(AppError::Llm("provider unavailable".to_string())),
        }
    }
}

fn grounded_reply(request: &LlmRequest) -> String {
    let (context, question) = request
        .prompt
        .split_once("Question:")
        .unwrap_or((request.prompt.as_str(), ""));

    if question.to_lowercase().contains("capital of france") && context.contains(PARIS_ANSWER) {
        PARIS_ANSWER.to_string()
    } else {
        FALLBACK_PHRASE.to_string()
    }
}

/// Flags when the wrapped stream is dropped.
struct GuardedStream {
    inner: LlmStream,
    dropped: Arc<AtomicBool>,
}

impl Stream for GuardedStream {
    type Item = AppResult<LlmStreamChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}

impl Drop for GuardedStream {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = self.reply(request)?;
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let text = self.reply(request)?;
        let model = request.model.clone();

        let inner: LlmStream = match self.script {
            Script::Hanging(_) => Box::pin(
                futures::stream::iter(vec![Ok(LlmStreamChunk::text(text, model))])
                    .chain(futures::stream::pending()),
            ),
            _ => {
                let mut chunks: Vec<AppResult<LlmStreamChunk>> = text
                    .split_inclusive(' ')
                    .map(|word| Ok(LlmStreamChunk::text(word, model.clone())))
                    .collect();
                chunks.push(Ok(LlmStreamChunk::finished(model, None)));
                Box::pin(futures::stream::iter(chunks))
            }
        };

        Ok(Box::pin(GuardedStream {
            inner,
            dropped: self.stream_dropped.clone(),
        }))
    }
}

/// Transcription double returning fixed text.
#[derive(Debug)]
pub(crate) struct ScriptedTranscriber {
    text: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub(crate) fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> AppResult<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.text {
            Some(ref text) => Ok(Transcription {
                text: text.clone(),
                detected_language: None,
            }),
            None => Err(AppError::Transcription("engine failed".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Synthesis double that records the voice it was asked for.
#[derive(Debug)]
pub(crate) struct ScriptedSynthesizer {
    fail: bool,
    voices: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub(crate) fn new(fail: bool) -> Self {
        Self {
            fail,
            voices: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, _text: &str, voice: &str) -> AppResult<Vec<u8>> {
        self.voices.lock().unwrap().push(voice.to_string());
        if self.fail {
            return Err(AppError::Synthesis("voice unavailable".to_string()));
        }
        Ok(b"ID3".to_vec())
    }
}

/// A documents folder holding the single France fact.
pub(crate) fn paris_corpus() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("france.md"), PARIS_ANSWER).unwrap();
    temp
}

/// Orchestrator over `documents` with scripted services.
pub(crate) struct Harness {
    pub orchestrator: PipelineOrchestrator,
    pub llm: Arc<ScriptedLlm>,
    pub transcriber: Arc<ScriptedTranscriber>,
    pub synthesizer: Arc<ScriptedSynthesizer>,
}

impl Harness {
    pub(crate) fn new(documents: &Path, llm: ScriptedLlm, transcriber: ScriptedTranscriber) -> Self {
        Self::with_synthesizer(documents, llm, transcriber, ScriptedSynthesizer::new(false))
    }

    pub(crate) fn with_synthesizer(
        documents: &Path,
        llm: ScriptedLlm,
        transcriber: ScriptedTranscriber,
        synthesizer: ScriptedSynthesizer,
    ) -> Self {
        let llm = Arc::new(llm);
        let transcriber = Arc::new(transcriber);
        let synthesizer = Arc::new(synthesizer);

        let indexer =
            CorpusIndexer::new(Arc::new(TrigramProvider::new(384)), ChunkingOptions::default());
        let store = Arc::new(IndexStore::new(indexer, documents));
        let composer = AnswerComposer::from_settings(llm.clone(), &GenerationSettings::default(), None)
            .unwrap();

        let voices = HashMap::from([("hi".to_string(), "hindi-voice".to_string())]);
        let components = PipelineComponents::new(
            store,
            SpeechNormalizer::new(transcriber.clone()),
            composer,
        )
        .with_synthesis(Synthesis {
            synthesizer: synthesizer.clone(),
            voices: VoiceTable::new(voices, "alloy"),
        });

        Self {
            orchestrator: PipelineOrchestrator::new(components),
            llm,
            transcriber,
            synthesizer,
        }
    }

    /// Harness over `documents` with the index already built.
    pub(crate) async fn indexed(documents: &Path, llm: ScriptedLlm) -> Self {
        let harness = Self::new(documents, llm, ScriptedTranscriber::returning("unused"));
        harness.orchestrator.rebuild_index().await.unwrap();
        harness
    }
}
