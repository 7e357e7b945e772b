//! Process-wide services shared by every request.

use crate::composer::AnswerComposer;
use crate::language::LanguageResolver;
use crate::speech::{OpenAiSynthesizer, OpenAiTranscriber, SpeechNormalizer, SpeechSynthesizer, VoiceTable};
use docchat_core::{AppConfig, AppResult};
use docchat_knowledge::{create_provider, ChunkingOptions, CorpusIndexer, IndexStore, Retriever, DEFAULT_TOP_K};
use std::sync::Arc;

/// Optional answer voicing.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub voices: VoiceTable,
}

/// Everything the orchestrator needs, constructed once at startup.
#[derive(Debug)]
pub struct PipelineComponents {
    pub store: Arc<IndexStore>,
    pub retriever: Retriever,
    pub resolver: LanguageResolver,
    pub speech: SpeechNormalizer,
    pub composer: AnswerComposer,
    pub synthesis: Option<Synthesis>,
    pub top_k: usize,
}

impl PipelineComponents {
    /// Assemble components with default language detection and `top_k`.
    ///
    /// The retriever shares the indexer's embedding provider so queries and
    /// chunks are always embedded alike.
    pub fn new(store: Arc<IndexStore>, speech: SpeechNormalizer, composer: AnswerComposer) -> Self {
        let retriever = Retriever::new(store.indexer().embedder().clone());
        Self {
            store,
            retriever,
            resolver: LanguageResolver::default(),
            speech,
            composer,
            synthesis: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_resolver(mut self, resolver: LanguageResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_synthesis(mut self, synthesis: Synthesis) -> Self {
        self.synthesis = Some(synthesis);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Build every service from configuration. Nothing is indexed yet.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let llm = docchat_llm::create_client(&config.generation)?;
        tracing::info!(
            "Generation: {} / {}",
            llm.provider_name(),
            config.generation.model
        );

        let embedder = create_provider(&config.embedding).await?;
        tracing::info!(
            "Embeddings: {} / {} ({} dims)",
            embedder.provider_name(),
            embedder.model_name(),
            embedder.dimensions()
        );

        let chunking = ChunkingOptions {
            chunk_size: config.retrieval.chunk_size,
            chunk_overlap: config.retrieval.chunk_overlap,
        };
        let store = Arc::new(IndexStore::new(
            CorpusIndexer::new(embedder, chunking),
            config.documents_dir.clone(),
        ));

        let transcriber = OpenAiTranscriber::from_settings(&config.transcription)?;
        let speech = SpeechNormalizer::new(Arc::new(transcriber));

        let composer = AnswerComposer::from_settings(
            llm,
            &config.generation,
            config.prompts_dir.as_deref(),
        )?;

        let mut components =
            Self::new(store, speech, composer).with_top_k(config.retrieval.top_k);

        if let Some(ref settings) = config.synthesis {
            components = components.with_synthesis(Synthesis {
                synthesizer: Arc::new(OpenAiSynthesizer::from_settings(settings)?),
                voices: VoiceTable::from(settings),
            });
        }

        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PipelineOrchestrator;
    use crate::types::BASIC_MODE_NOTICE;
    use tempfile::TempDir;

    /// Local services only, with embeddings pointed at a closed port.
    fn unreachable_embedding_config(workspace: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.workspace = workspace.path().to_path_buf();
        config.documents_dir = workspace.path().join("documents");
        config.generation.provider = "ollama".to_string();
        config.generation.api_key_env = None;
        config.embedding.provider = "ollama".to_string();
        config.embedding.model = "nomic-embed-text".to_string();
        config.embedding.dimensions = 768;
        config.embedding.endpoint = Some("http://127.0.0.1:1".to_string());
        config.transcription.api_key_env = None;
        config
    }

    #[tokio::test]
    async fn test_unreachable_embeddings_start_in_basic_mode() {
        let workspace = TempDir::new().unwrap();
        std::fs::create_dir_all(workspace.path().join("documents")).unwrap();
        std::fs::write(
            workspace.path().join("documents").join("france.md"),
            "Paris is the capital of France.",
        )
        .unwrap();

        let config = unreachable_embedding_config(&workspace);
        config.validate().unwrap();

        let components = PipelineComponents::from_config(&config).await.unwrap();
        let orchestrator = PipelineOrchestrator::new(components);

        assert!(orchestrator.rebuild_index().await.is_err());
        assert!(!orchestrator.index_status().await.ready);

        let envelope = orchestrator
            .process_text("What is the capital of France?", None)
            .await
            .unwrap();
        assert_eq!(envelope.response, BASIC_MODE_NOTICE);
    }
}
