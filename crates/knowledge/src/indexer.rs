//! Corpus indexer: folder scan, extraction, chunking and embedding.

use crate::chunker::{self, ChunkingOptions};
use crate::embeddings::EmbeddingProvider;
use crate::index::KnowledgeIndex;
use crate::parser;
use crate::types::{ChunkCandidate, IndexStats, KnowledgeChunk, MediaKind, SourceDocument};
use chrono::Utc;
use docchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Builds a [`KnowledgeIndex`] from a flat folder of documents.
#[derive(Debug, Clone)]
pub struct CorpusIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingOptions,
}

impl CorpusIndexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, chunking: ChunkingOptions) -> Self {
        Self { embedder, chunking }
    }

    /// The embedding provider used for chunks (and therefore for queries).
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Scan `folder` and build an index.
    ///
    /// Unsupported or failing files are logged and skipped. An error means no
    /// index could be built: the folder was missing or empty, every file was
    /// skipped, or embedding failed.
    pub async fn build(&self, folder: &Path) -> AppResult<KnowledgeIndex> {
        let start = Instant::now();

        if !folder.exists() {
            std::fs::create_dir_all(folder)?;
            tracing::info!("Created documents folder {:?}", folder);
            return Err(AppError::Knowledge(format!(
                "No documents to index in {:?}",
                folder
            )));
        }

        tracing::info!("Indexing documents in {:?}", folder);

        let splitter = chunker::splitter(&self.chunking)?;
        let mut candidates: Vec<ChunkCandidate> = Vec::new();
        let mut documents_indexed = 0usize;
        let mut documents_skipped = 0usize;

        for path in list_files(folder) {
            let Some(kind) = MediaKind::from_path(&path) else {
                tracing::warn!("Skipping unsupported file: {:?}", path);
                documents_skipped += 1;
                continue;
            };

            let document = match load_document(path.clone(), kind).await {
                Ok(document) => document,
                Err(e) => {
                    tracing::error!("Error loading {:?}: {}", path, e);
                    documents_skipped += 1;
                    continue;
                }
            };

            let chunks = chunker::chunk_document(&document, &splitter);
            if chunks.is_empty() {
                tracing::warn!("Skipping {:?}: no extractable text", path);
                documents_skipped += 1;
                continue;
            }

            tracing::info!(
                "Loaded {} ({}, {} chunks)",
                document.source_name,
                kind.as_str(),
                chunks.len()
            );
            documents_indexed += 1;
            candidates.extend(chunks);
        }

        if candidates.is_empty() {
            return Err(AppError::Knowledge(format!(
                "No documents could be indexed in {:?} ({} skipped)",
                folder, documents_skipped
            )));
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != candidates.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                candidates.len()
            )));
        }

        let chunks: Vec<KnowledgeChunk> = candidates
            .into_iter()
            .zip(embeddings)
            .map(|(candidate, embedding)| KnowledgeChunk::from_candidate(candidate, embedding))
            .collect();

        let stats = IndexStats {
            documents_indexed,
            documents_skipped,
            chunks: chunks.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            built_at: Utc::now(),
            embedding_model: self.embedder.model_name().to_string(),
            dimensions: self.embedder.dimensions(),
        };

        tracing::info!(
            "Index built: {} documents, {} skipped, {} chunks in {}ms",
            stats.documents_indexed,
            stats.documents_skipped,
            stats.chunks,
            stats.duration_ms
        );

        KnowledgeIndex::new(
            chunks,
            self.embedder.model_name(),
            self.embedder.dimensions(),
            stats,
        )
    }
}

/// Regular files directly inside `folder`, sorted by file name.
fn list_files(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Extract a document off the async runtime; adapters are blocking.
async fn load_document(path: PathBuf, kind: MediaKind) -> AppResult<SourceDocument> {
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let text = tokio::task::spawn_blocking(move || parser::extract_text(&path, kind))
        .await
        .map_err(|e| AppError::Knowledge(format!("Extraction task failed: {}", e)))??;

    Ok(SourceDocument::new(source_name, kind, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    fn indexer() -> CorpusIndexer {
        CorpusIndexer::new(Arc::new(TrigramProvider::new(64)), ChunkingOptions::default())
    }

    #[tokio::test]
    async fn test_build_from_markdown() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.md"), "Paris is the capital of France.").unwrap();
        std::fs::write(temp.path().join("a.markdown"), "Madrid is the capital of Spain.").unwrap();

        let index = indexer().build(temp.path()).await.unwrap();

        assert_eq!(index.stats().documents_indexed, 2);
        assert_eq!(index.stats().chunks, 2);
        assert_eq!(index.embedding_model(), "trigram-v1");
        assert_eq!(index.chunks()[0].source_name, "a.markdown");
    }

    #[tokio::test]
    async fn test_unsupported_and_empty_files_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.md"), "Paris is the capital of France.").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "plain text is not indexed").unwrap();
        std::fs::write(temp.path().join("empty.md"), "   \n").unwrap();
        std::fs::write(temp.path().join("broken.pptx"), "not a zip").unwrap();

        let index = indexer().build(temp.path()).await.unwrap();

        assert_eq!(index.stats().documents_indexed, 1);
        assert_eq!(index.stats().documents_skipped, 3);
    }

    #[tokio::test]
    async fn test_subdirectories_ignored() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        std::fs::write(temp.path().join("nested/inner.md"), "Hidden text.").unwrap();
        std::fs::write(temp.path().join("top.md"), "Visible text.").unwrap();

        let index = indexer().build(temp.path()).await.unwrap();
        assert_eq!(index.stats().documents_indexed, 1);
    }

    #[tokio::test]
    async fn test_empty_folder_yields_no_index() {
        let temp = TempDir::new().unwrap();
        assert!(indexer().build(temp.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_folder_created() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("documents");

        assert!(indexer().build(&folder).await.is_err());
        assert!(folder.is_dir());
    }

    #[tokio::test]
    async fn test_rebuild_is_deterministic() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "Paris is the capital of France.").unwrap();

        let first = indexer().build(temp.path()).await.unwrap();
        let second = indexer().build(temp.path()).await.unwrap();

        assert_eq!(first.chunks()[0].id(), second.chunks()[0].id());
        assert_eq!(first.chunks()[0].embedding, second.chunks()[0].embedding);
    }
}
