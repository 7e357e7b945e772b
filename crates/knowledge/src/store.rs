//! Holder for the index currently being served.
//!
//! Readers take a cheap `Arc` snapshot; a rebuild builds a fresh index off to
//! the side and swaps it in atomically once complete.

use crate::index::KnowledgeIndex;
use crate::indexer::CorpusIndexer;
use crate::types::{IndexStats, IndexStatus};
use docchat_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared, swappable reference to the active index.
#[derive(Debug)]
pub struct IndexStore {
    indexer: CorpusIndexer,
    documents_dir: PathBuf,
    current: RwLock<Option<Arc<KnowledgeIndex>>>,
    rebuild_lock: Mutex<()>,
}

impl IndexStore {
    /// Create an empty store. Nothing is indexed until [`IndexStore::rebuild`].
    pub fn new(indexer: CorpusIndexer, documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            indexer,
            documents_dir: documents_dir.into(),
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Create a store already serving `index`.
    pub fn with_index(
        indexer: CorpusIndexer,
        documents_dir: impl Into<PathBuf>,
        index: KnowledgeIndex,
    ) -> Self {
        Self {
            indexer,
            documents_dir: documents_dir.into(),
            current: RwLock::new(Some(Arc::new(index))),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn indexer(&self) -> &CorpusIndexer {
        &self.indexer
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// Snapshot of the active index, if any.
    ///
    /// A request keeps using its snapshot even if a rebuild swaps the index
    /// mid-flight.
    pub async fn current(&self) -> Option<Arc<KnowledgeIndex>> {
        self.current.read().await.clone()
    }

    /// Rebuild from the documents folder and swap the result in.
    ///
    /// Only one rebuild may run at a time; a second caller gets an error
    /// instead of waiting. When the build fails the previous index stays
    /// active.
    pub async fn rebuild(&self) -> AppResult<IndexStats> {
        let _guard = self
            .rebuild_lock
            .try_lock()
            .map_err(|_| AppError::Knowledge("Index rebuild already in progress".to_string()))?;

        let index = match self.indexer.build(&self.documents_dir).await {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!("Index rebuild failed, keeping previous index: {}", e);
                return Err(e);
            }
        };

        let stats = index.stats().clone();
        *self.current.write().await = Some(Arc::new(index));

        tracing::info!("Swapped in new index ({} chunks)", stats.chunks);
        Ok(stats)
    }

    /// Whether an index is being served, with its build statistics.
    pub async fn status(&self) -> IndexStatus {
        match self.current().await {
            Some(index) => IndexStatus {
                ready: true,
                stats: Some(index.stats().clone()),
            },
            None => IndexStatus {
                ready: false,
                stats: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkingOptions;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    fn store(dir: &Path) -> IndexStore {
        let indexer =
            CorpusIndexer::new(Arc::new(TrigramProvider::new(64)), ChunkingOptions::default());
        IndexStore::new(indexer, dir)
    }

    #[tokio::test]
    async fn test_status_before_first_build() {
        let temp = TempDir::new().unwrap();
        let store = store(temp.path());

        let status = store.status().await;
        assert!(!status.ready);
        assert!(status.stats.is_none());
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_rebuild_swaps_index() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "Paris is the capital of France.").unwrap();
        let store = store(temp.path());

        let stats = store.rebuild().await.unwrap();
        assert_eq!(stats.documents_indexed, 1);

        std::fs::write(temp.path().join("b.md"), "Madrid is the capital of Spain.").unwrap();
        let stats = store.rebuild().await.unwrap();
        assert_eq!(stats.documents_indexed, 2);

        let status = store.status().await;
        assert!(status.ready);
        assert_eq!(status.stats.unwrap().documents_indexed, 2);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_index() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "Paris is the capital of France.").unwrap();
        let store = store(temp.path());
        store.rebuild().await.unwrap();

        std::fs::remove_file(temp.path().join("a.md")).unwrap();
        assert!(store.rebuild().await.is_err());

        let current = store.current().await.unwrap();
        assert_eq!(current.stats().documents_indexed, 1);
    }

    #[tokio::test]
    async fn test_snapshot_survives_swap() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "Paris is the capital of France.").unwrap();
        let store = store(temp.path());
        store.rebuild().await.unwrap();

        let snapshot = store.current().await.unwrap();
        std::fs::write(temp.path().join("b.md"), "Madrid is the capital of Spain.").unwrap();
        store.rebuild().await.unwrap();

        assert_eq!(snapshot.stats().documents_indexed, 1);
        assert_eq!(store.current().await.unwrap().stats().documents_indexed, 2);
    }

    #[tokio::test]
    async fn test_concurrent_rebuild_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "Paris is the capital of France.").unwrap();
        let store = store(temp.path());

        let _held = store.rebuild_lock.lock().await;
        let err = store.rebuild().await.unwrap_err();
        assert!(err.to_string().contains("already in progress"));
    }
}
