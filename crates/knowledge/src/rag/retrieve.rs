//! Query embedding and nearest-neighbour retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::index::KnowledgeIndex;
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Number of chunks retrieved per query unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// A chunk returned for a query, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// `<source_id>:<sequence_index>`
    pub id: String,
    pub source_name: String,
    pub sequence_index: u32,
    pub text: String,
    pub score: f32,
}

/// Embeds queries with the provider the index was built with and searches it.
#[derive(Debug, Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Return up to `top_k` chunks, most similar first.
    ///
    /// Fails when the query embedder is not the one the index was built
    /// with.
    #[instrument(skip(self, index, query), fields(chunks = index.len()))]
    pub async fn retrieve(
        &self,
        index: &KnowledgeIndex,
        query: &str,
        top_k: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        self.check_compatible(index)?;

        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = index.search(&query_embedding, top_k)?;

        if let Some((_, best)) = results.first() {
            tracing::debug!("Retrieved {} chunks, best score {:.3}", results.len(), best);
        }

        Ok(results
            .into_iter()
            .map(|(chunk, score)| RetrievedChunk {
                id: chunk.id(),
                source_name: chunk.source_name.clone(),
                sequence_index: chunk.sequence_index,
                text: chunk.text.clone(),
                score,
            })
            .collect())
    }

    fn check_compatible(&self, index: &KnowledgeIndex) -> AppResult<()> {
        if self.embedder.model_name() != index.embedding_model()
            || self.embedder.dimensions() != index.dimensions()
        {
            return Err(AppError::Knowledge(format!(
                "Query embedder {} ({} dims) does not match index built with {} ({} dims)",
                self.embedder.model_name(),
                self.embedder.dimensions(),
                index.embedding_model(),
                index.dimensions()
            )));
        }
        Ok(())
    }
}
