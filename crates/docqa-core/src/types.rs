//! Domain types shared by the chunker, the vector store and the pipelines.

use serde::{Deserialize, Serialize};

pub type ChunkId = u64;

/// A unit of retrievable text.
///
/// - `id`: assigned by the registry in ingestion order; equal to the chunk's
///   position in the vector index
/// - `text`: the non-empty, length-bounded payload
/// - `source_document`: file name (or other identifier) of the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source_document: String,
}

/// Chunker output before the registry assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDraft {
    pub text: String,
    pub source_document: String,
}

/// Per-chunk metadata as persisted next to the ordered text list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub id: ChunkId,
    pub source_document: String,
}

impl From<&Chunk> for ChunkMetadata {
    fn from(chunk: &Chunk) -> Self {
        Self { id: chunk.id, source_document: chunk.source_document.clone() }
    }
}

/// One page of extracted text. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// A document handed to the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    /// Lower-cased extension of `name`, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// A k-NN hit: index position and squared L2 distance (lower is closer).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub position: usize,
    pub distance: f32,
}

/// A resolved hit used as answer context and shown as a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedChunk {
    pub id: ChunkId,
    pub text: String,
    pub source_document: String,
    pub distance: f32,
}
