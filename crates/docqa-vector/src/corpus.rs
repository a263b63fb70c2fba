//! The vector index and the chunk registry, kept in lock-step.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use docqa_core::types::{ChunkDraft, ChunkId, CitedChunk, SearchResult};
use docqa_core::{Error, Result};

use crate::index::FlatIndex;
use crate::registry::Registry;

/// Index row *i* and registry entry *i* always describe the same chunk.
/// Every mutation either touches both or neither.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    index: FlatIndex,
    registry: Registry,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn from_parts(index: FlatIndex, registry: Registry) -> Result<Self> {
        if index.len() != registry.size() {
            return Err(Error::snapshot(format!(
                "index holds {} vectors but registry holds {} chunks",
                index.len(),
                registry.size()
            )));
        }
        Ok(Self { index, registry })
    }

    /// Commit one ingestion batch's chunks and their vectors together.
    ///
    /// Fails without changing anything if the counts differ or any vector has
    /// the wrong dimension.
    pub fn append_batch(&mut self, drafts: Vec<ChunkDraft>, vectors: Vec<Vec<f32>>) -> Result<Vec<ChunkId>> {
        if drafts.len() != vectors.len() {
            return Err(Error::embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                drafts.len()
            )));
        }
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        self.index.append(&vectors)?;
        let ids = self.registry.append(drafts);
        debug!(added = ids.len(), total = self.len(), "corpus batch committed");
        Ok(ids)
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.index.search(query, k)
    }

    /// Attach chunk text and source to each hit, keeping the hit order.
    pub fn resolve(&self, hits: &[SearchResult]) -> Vec<CitedChunk> {
        hits.iter()
            .filter_map(|hit| match self.registry.get(hit.position) {
                Ok(chunk) => Some(CitedChunk {
                    id: chunk.id,
                    text: chunk.text.clone(),
                    source_document: chunk.source_document.clone(),
                    distance: hit.distance,
                }),
                Err(e) => {
                    warn!(error = %e, "search hit without registry entry");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize { self.registry.size() }

    pub fn is_empty(&self) -> bool { self.registry.is_empty() }

    pub fn dimension(&self) -> Option<usize> { self.index.dimension() }

    pub fn distinct_sources(&self) -> BTreeSet<String> { self.registry.distinct_sources() }

    pub fn index(&self) -> &FlatIndex { &self.index }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn reset(&mut self) {
        self.index.reset();
        self.registry.reset();
    }
}
