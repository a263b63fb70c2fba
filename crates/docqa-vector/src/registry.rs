//! Ordered chunk registry: row *i* of the vector index describes chunk *i*.

use std::collections::BTreeSet;

use docqa_core::types::{Chunk, ChunkDraft, ChunkId, ChunkMetadata};
use docqa_core::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    chunks: Vec<Chunk>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// Rebuild from the persisted text list and metadata list.
    pub fn from_parts(texts: Vec<String>, metadata: Vec<ChunkMetadata>) -> Result<Self> {
        if texts.len() != metadata.len() {
            return Err(Error::snapshot(format!(
                "{} chunk texts but {} metadata records",
                texts.len(),
                metadata.len()
            )));
        }
        let mut chunks = Vec::with_capacity(texts.len());
        for (position, (text, meta)) in texts.into_iter().zip(metadata).enumerate() {
            if meta.id != position as ChunkId {
                return Err(Error::snapshot(format!("metadata record {position} has id {}", meta.id)));
            }
            chunks.push(Chunk { id: meta.id, text, source_document: meta.source_document });
        }
        Ok(Self { chunks })
    }

    /// Assign consecutive ids starting at the current size and store the drafts in order.
    pub fn append(&mut self, drafts: Vec<ChunkDraft>) -> Vec<ChunkId> {
        let start = self.chunks.len() as ChunkId;
        let ids: Vec<ChunkId> = (start..start + drafts.len() as ChunkId).collect();
        self.chunks.extend(drafts.into_iter().zip(&ids).map(|(d, &id)| Chunk {
            id,
            text: d.text,
            source_document: d.source_document,
        }));
        ids
    }

    pub fn get(&self, position: usize) -> Result<&Chunk> {
        self.chunks.get(position).ok_or(Error::NotFound(position))
    }

    pub fn distinct_sources(&self) -> BTreeSet<String> {
        self.chunks.iter().map(|c| c.source_document.clone()).collect()
    }

    pub fn size(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn metadata(&self) -> Vec<ChunkMetadata> {
        self.chunks.iter().map(ChunkMetadata::from).collect()
    }

    pub fn reset(&mut self) { self.chunks.clear(); }
}
