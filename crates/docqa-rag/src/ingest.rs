//! Extract → chunk → embed → append → persist.

use std::fmt;

use tracing::{debug, info, warn};

use docqa_core::chunker::Chunker;
use docqa_core::traits::{Embedder, TextExtractor};
use docqa_core::types::{ChunkDraft, ChunkId, PageText, SourceDocument};
use docqa_core::Result;
use docqa_vector::{Corpus, SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Idle,
    Extracting,
    Chunking,
    Embedding,
    Indexing,
    Persisted,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Indexing => "indexing",
            Self::Persisted => "persisted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Ingested { chunks: usize },
    NoContent,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub name: String,
    pub outcome: DocumentOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub stage: IngestStage,
    pub documents: Vec<DocumentReport>,
    pub chunk_ids: Vec<ChunkId>,
    /// Set when the corpus was updated in memory but the snapshot write failed.
    pub persist_error: Option<String>,
}

impl IngestReport {
    pub fn chunks_added(&self) -> usize { self.chunk_ids.len() }

    pub fn failed(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| matches!(d.outcome, DocumentOutcome::Failed { .. }))
    }
}

/// Observer for long ingests. Every method has a no-op default.
pub trait IngestProgress {
    fn stage(&self, _stage: IngestStage) {}
    fn document_done(&self, _report: &DocumentReport) {}
}

impl IngestProgress for () {}

/// Page texts joined the way the chunker sees them: each page preceded by a
/// `[PAGE n]` marker line.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut text = String::new();
    for page in pages {
        text.push_str(&format!("\n[PAGE {}]\n{}\n", page.page_number, page.text));
    }
    text
}

pub struct IngestPipeline<'a> {
    pub chunker: &'a Chunker,
    pub extractor: &'a dyn TextExtractor,
    pub embedder: &'a dyn Embedder,
}

impl IngestPipeline<'_> {
    /// Ingest `documents` as one batch.
    ///
    /// Extraction failures are recorded per document and skipped. An
    /// embedding or dimension error aborts the batch with the corpus
    /// untouched. A snapshot write failure after the in-memory commit is
    /// reported in [`IngestReport::persist_error`].
    pub fn run(
        &self,
        corpus: &mut Corpus,
        store: &SnapshotStore,
        documents: &[SourceDocument],
        progress: &dyn IngestProgress,
    ) -> Result<IngestReport> {
        let mut reports = Vec::with_capacity(documents.len());
        let mut drafts: Vec<ChunkDraft> = Vec::new();

        for doc in documents {
            progress.stage(IngestStage::Extracting);
            let pages = match self.extractor.extract(&doc.name, &doc.bytes) {
                Ok(pages) => pages,
                Err(e) => {
                    warn!(document = %doc.name, error = %e, "extraction failed, skipping document");
                    let report = DocumentReport { name: doc.name.clone(), outcome: DocumentOutcome::Failed { reason: e.to_string() } };
                    progress.document_done(&report);
                    reports.push(report);
                    continue;
                }
            };

            progress.stage(IngestStage::Chunking);
            let doc_drafts = self.chunker.chunk(&join_pages(&pages), &doc.name);
            debug!(document = %doc.name, pages = pages.len(), chunks = doc_drafts.len(), "chunked document");
            let outcome = if doc_drafts.is_empty() {
                DocumentOutcome::NoContent
            } else {
                DocumentOutcome::Ingested { chunks: doc_drafts.len() }
            };
            drafts.extend(doc_drafts);
            let report = DocumentReport { name: doc.name.clone(), outcome };
            progress.document_done(&report);
            reports.push(report);
        }

        if drafts.is_empty() {
            info!(documents = documents.len(), "no content to index");
            progress.stage(IngestStage::Idle);
            return Ok(IngestReport { stage: IngestStage::Idle, documents: reports, chunk_ids: Vec::new(), persist_error: None });
        }

        progress.stage(IngestStage::Embedding);
        let texts: Vec<String> = drafts.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        progress.stage(IngestStage::Indexing);
        let chunk_ids = corpus.append_batch(drafts, vectors)?;
        info!(added = chunk_ids.len(), total = corpus.len(), "indexed chunks");

        let (stage, persist_error) = match store.save(corpus) {
            Ok(()) => (IngestStage::Persisted, None),
            Err(e) => {
                warn!(error = %e, "snapshot not written; in-memory corpus is ahead of disk");
                (IngestStage::Indexing, Some(e.to_string()))
            }
        };
        progress.stage(stage);
        Ok(IngestReport { stage, documents: reports, chunk_ids, persist_error })
    }
}
