//! Vector index abstraction for knowledge chunks.

use crate::types::KnowledgeChunk;
use docchat_core::AppResult;

/// Trait for nearest-neighbour search over embedded chunks.
///
/// Implementations are read-only once built.
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns at most `top_k` chunks ordered by descending similarity.
    /// Equal scores are ordered by `sequence_index`, then by build order.
    fn search(&self, query_embedding: &[f32], top_k: usize)
        -> AppResult<Vec<(&KnowledgeChunk, f32)>>;

    /// Number of chunks in the index.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
