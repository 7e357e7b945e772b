//! Retrieval over the active knowledge index.

pub mod retrieve;

pub use retrieve::{RetrievedChunk, Retriever, DEFAULT_TOP_K};
