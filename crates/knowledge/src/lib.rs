//! Document corpus indexing and retrieval.
//!
//! Builds an in-memory vector index from a flat folder of PDF, slide and
//! markdown files, and serves nearest-neighbour queries over it.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod indexer;
pub mod parser;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::ChunkingOptions;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::KnowledgeIndex;
pub use indexer::CorpusIndexer;
pub use rag::{RetrievedChunk, Retriever, DEFAULT_TOP_K};
pub use store::IndexStore;
pub use types::{IndexStats, IndexStatus, KnowledgeChunk, MediaKind, SourceDocument};
pub use vector_index::VectorIndex;
