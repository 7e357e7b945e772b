//! In-memory vector index over embedded chunks.

use crate::types::{IndexStats, KnowledgeChunk};
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use std::cmp::Ordering;

/// Immutable index built from one full corpus scan.
///
/// Records the embedding model and dimension it was built with; queries
/// embedded differently are rejected.
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    chunks: Vec<KnowledgeChunk>,
    embedding_model: String,
    dimensions: usize,
    stats: IndexStats,
}

impl KnowledgeIndex {
    /// Assemble an index. Every chunk embedding must have `dimensions` entries.
    pub fn new(
        chunks: Vec<KnowledgeChunk>,
        embedding_model: impl Into<String>,
        dimensions: usize,
        stats: IndexStats,
    ) -> AppResult<Self> {
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(AppError::Knowledge(format!(
                "Chunk {} has {} dimensions, index expects {}",
                bad.id(),
                bad.embedding.len(),
                dimensions
            )));
        }

        Ok(Self {
            chunks,
            embedding_model: embedding_model.into(),
            dimensions,
            stats,
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }
}

impl VectorIndex for KnowledgeIndex {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(&KnowledgeChunk, f32)>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query embedding has {} dimensions, index expects {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, &KnowledgeChunk, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| {
                (
                    position,
                    chunk,
                    cosine_similarity(query_embedding, &chunk.embedding),
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.sequence_index.cmp(&b.1.sequence_index))
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, chunk, score)| (chunk, score))
            .collect())
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 for vectors of different length or zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stats(chunks: usize) -> IndexStats {
        IndexStats {
            documents_indexed: 1,
            documents_skipped: 0,
            chunks,
            duration_ms: 0,
            built_at: Utc::now(),
            embedding_model: "test".to_string(),
            dimensions: 2,
        }
    }

    fn chunk(source: &str, seq: u32, embedding: Vec<f32>) -> KnowledgeChunk {
        KnowledgeChunk {
            source_id: source.to_string(),
            source_name: format!("{}.md", source),
            sequence_index: seq,
            text: format!("{} #{}", source, seq),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rejects_wrong_chunk_dimensions() {
        let result = KnowledgeIndex::new(vec![chunk("a", 0, vec![1.0])], "test", 2, stats(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_search_rejects_wrong_query_dimensions() {
        let index =
            KnowledgeIndex::new(vec![chunk("a", 0, vec![1.0, 0.0])], "test", 2, stats(1)).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 5).is_err());
    }

    #[test]
    fn test_ties_break_by_sequence_then_build_order() {
        let index = KnowledgeIndex::new(
            vec![
                chunk("b", 2, vec![1.0, 0.0]),
                chunk("a", 1, vec![1.0, 0.0]),
                chunk("c", 1, vec![1.0, 0.0]),
                chunk("d", 0, vec![0.0, 1.0]),
            ],
            "test",
            2,
            stats(4),
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0], 10).unwrap();
        let order: Vec<&str> = results.iter().map(|(c, _)| c.source_id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_top_k_limits_results() {
        let chunks = (0..8).map(|i| chunk("a", i, vec![1.0, i as f32])).collect();
        let index = KnowledgeIndex::new(chunks, "test", 2, stats(8)).unwrap();

        assert_eq!(index.search(&[1.0, 0.0], 5).unwrap().len(), 5);
        assert_eq!(index.len(), 8);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = KnowledgeIndex::new(Vec::new(), "test", 2, stats(0)).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }
}
