//! Tests for retrieval ranking over a built corpus.

use crate::chunker::ChunkingOptions;
use crate::embeddings::providers::trigram::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::indexer::CorpusIndexer;
use crate::rag::{Retriever, DEFAULT_TOP_K};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(TrigramProvider::new(384))
}

fn corpus() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "france.md", "Paris is the capital of France.");
    write(
        temp.path(),
        "cooking.md",
        "Boil pasta in salted water for ten minutes before draining.",
    );
    write(
        temp.path(),
        "plants.md",
        "Photosynthesis converts sunlight into chemical energy inside leaves.",
    );
    temp
}

#[tokio::test]
async fn test_relevant_chunk_ranks_first() {
    let temp = corpus();
    let embedder = embedder();
    let index = CorpusIndexer::new(embedder.clone(), ChunkingOptions::default())
        .build(temp.path())
        .await
        .unwrap();

    let results = Retriever::new(embedder)
        .retrieve(&index, "What is the capital of France?", DEFAULT_TOP_K)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].text, "Paris is the capital of France.");
}

#[tokio::test]
async fn test_scores_are_ordered_descending() {
    let temp = corpus();
    let embedder = embedder();
    let index = CorpusIndexer::new(embedder.clone(), ChunkingOptions::default())
        .build(temp.path())
        .await
        .unwrap();

    let results = Retriever::new(embedder)
        .retrieve(&index, "How long should pasta boil?", DEFAULT_TOP_K)
        .await
        .unwrap();

    for pair in results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "Scores should be ordered: {} >= {}",
            pair[0].score,
            pair[1].score
        );
    }
    assert_eq!(results[0].source_name, "cooking.md");
}

#[tokio::test]
async fn test_top_k_bounds_results() {
    let temp = TempDir::new().unwrap();
    let long: String = (0..60)
        .map(|i| format!("Paragraph {} mentions the river Seine near Paris.\n\n", i))
        .collect();
    write(temp.path(), "seine.md", &long);

    let embedder = embedder();
    let options = ChunkingOptions {
        chunk_size: 120,
        chunk_overlap: 20,
    };
    let index = CorpusIndexer::new(embedder.clone(), options)
        .build(temp.path())
        .await
        .unwrap();
    assert!(index.chunks().len() > DEFAULT_TOP_K);

    let results = Retriever::new(embedder)
        .retrieve(&index, "river Seine", DEFAULT_TOP_K)
        .await
        .unwrap();
    assert_eq!(results.len(), DEFAULT_TOP_K);
}

#[tokio::test]
async fn test_indic_query_matches_same_script_document() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "delhi.md", "भारत की राजधानी नई दिल्ली है।");
    write(temp.path(), "chennai.md", "சென்னை தமிழ்நாட்டின் தலைநகரம் ஆகும்.");

    let embedder = embedder();
    let index = CorpusIndexer::new(embedder.clone(), ChunkingOptions::default())
        .build(temp.path())
        .await
        .unwrap();

    let results = Retriever::new(embedder)
        .retrieve(&index, "भारत की राजधानी क्या है?", 1)
        .await
        .unwrap();
    assert_eq!(results[0].source_name, "delhi.md");
}
