//! Text chunking with configurable size and overlap.
//!
//! Uses `text-splitter`, which splits recursively on the coarsest semantic
//! boundary that fits (paragraphs, then sentences, then words, then
//! characters). Sizes are measured in characters.

use crate::types::{ChunkCandidate, SourceDocument};
use docchat_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk size and overlap, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Build a splitter for the given options.
pub fn splitter(options: &ChunkingOptions) -> AppResult<TextSplitter<text_splitter::Characters>> {
    let config = ChunkConfig::new(options.chunk_size)
        .with_overlap(options.chunk_overlap)
        .map_err(|e| AppError::Knowledge(format!("Invalid chunking options: {}", e)))?;
    Ok(TextSplitter::new(config))
}

/// Split a document into ordered chunk candidates.
///
/// The same text and options always produce the same chunks.
pub fn chunk_document(
    document: &SourceDocument,
    splitter: &TextSplitter<text_splitter::Characters>,
) -> Vec<ChunkCandidate> {
    let chunks: Vec<ChunkCandidate> = splitter
        .chunks(&document.raw_text)
        .filter(|text| !text.trim().is_empty())
        .enumerate()
        .map(|(i, text)| ChunkCandidate {
            source_id: document.id.clone(),
            source_name: document.source_name.clone(),
            sequence_index: i as u32,
            text: text.to_string(),
        })
        .collect();

    tracing::debug!(
        "Chunked {} into {} chunks",
        document.source_name,
        chunks.len()
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaKind;

    fn document(text: &str) -> SourceDocument {
        SourceDocument::new("test.md", MediaKind::Markdown, text.to_string())
    }

    fn sentences(count: usize) -> String {
        (0..count)
            .map(|i| format!("Sentence {:03} describes topic number {}.", i, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = splitter(&ChunkingOptions::default()).unwrap();
        let chunks = chunk_document(&document("Paris is the capital of France."), &splitter);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Paris is the capital of France.");
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn test_chunks_respect_size_and_order() {
        let options = ChunkingOptions {
            chunk_size: 200,
            chunk_overlap: 50,
        };
        let splitter = splitter(&options).unwrap();
        let chunks = chunk_document(&document(&sentences(40)), &splitter);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i as u32);
            assert!(chunk.text.chars().count() <= 200);
        }
    }

    #[test]
    fn test_overlap_repeats_text() {
        let text = sentences(40);
        let options = ChunkingOptions {
            chunk_size: 200,
            chunk_overlap: 50,
        };
        let chunks = chunk_document(&document(&text), &splitter(&options).unwrap());

        let total: usize = chunks.iter().map(|c| c.text.len()).sum();
        assert!(total > text.len(), "Expected overlapping chunks");
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = sentences(30);
        let options = ChunkingOptions {
            chunk_size: 150,
            chunk_overlap: 30,
        };
        let first = chunk_document(&document(&text), &splitter(&options).unwrap());
        let second = chunk_document(&document(&text), &splitter(&options).unwrap());

        assert_eq!(first, second);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "भारत की राजधानी नई दिल्ली है। ".repeat(50);
        let options = ChunkingOptions {
            chunk_size: 100,
            chunk_overlap: 20,
        };
        let chunks = chunk_document(&document(&text), &splitter(&options).unwrap());

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 100));
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = splitter(&ChunkingOptions::default()).unwrap();
        assert!(chunk_document(&document("   \n  "), &splitter).is_empty());
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let options = ChunkingOptions {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(splitter(&options).is_err());
    }
}
