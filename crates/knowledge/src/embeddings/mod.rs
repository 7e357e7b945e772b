//! Embedding providers for corpus chunks and queries.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
