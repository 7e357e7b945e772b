//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Number of hex characters of the SHA-256 digest used as a source id.
const SOURCE_ID_LEN: usize = 16;

/// Media kinds the corpus indexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Slides,
    Markdown,
}

impl MediaKind {
    /// Detect the media kind from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Slides),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Slides => "slides",
            Self::Markdown => "markdown",
        }
    }
}

/// Text extracted from one source file. Discarded after chunking.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Deterministic id derived from the source name
    pub id: String,

    /// Extracted text
    pub raw_text: String,

    /// File name within the documents folder
    pub source_name: String,

    /// Adapter that produced the text
    pub media_kind: MediaKind,
}

impl SourceDocument {
    pub fn new(source_name: impl Into<String>, media_kind: MediaKind, raw_text: String) -> Self {
        let source_name = source_name.into();
        Self {
            id: source_id(&source_name),
            raw_text,
            source_name,
            media_kind,
        }
    }
}

/// Derive the source id: a SHA-256 prefix of the source name.
pub fn source_id(source_name: &str) -> String {
    let digest = Sha256::digest(source_name.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..SOURCE_ID_LEN].to_string()
}

/// Chunk text before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCandidate {
    pub source_id: String,
    pub source_name: String,
    pub sequence_index: u32,
    pub text: String,
}

/// An embedded chunk held by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Source document ID
    pub source_id: String,

    /// Source file name
    pub source_name: String,

    /// Position within the source document
    pub sequence_index: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl KnowledgeChunk {
    pub fn from_candidate(candidate: ChunkCandidate, embedding: Vec<f32>) -> Self {
        Self {
            source_id: candidate.source_id,
            source_name: candidate.source_name,
            sequence_index: candidate.sequence_index,
            text: candidate.text,
            embedding,
        }
    }

    /// External chunk id: `<source_id>:<sequence_index>`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.source_id, self.sequence_index)
    }
}

/// Statistics from an index build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Files that produced at least one chunk
    pub documents_indexed: usize,

    /// Files skipped (unsupported, unreadable or empty)
    pub documents_skipped: usize,

    /// Number of chunks in the index
    pub chunks: usize,

    /// Build duration in milliseconds
    pub duration_ms: u64,

    /// When the build finished
    pub built_at: DateTime<Utc>,

    /// Embedding model used for every chunk
    pub embedding_model: String,

    /// Embedding vector dimension
    pub dimensions: usize,
}

/// Whether an index is currently being served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    /// True when queries are answered from an index
    pub ready: bool,

    /// Statistics of the index being served
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,
}
