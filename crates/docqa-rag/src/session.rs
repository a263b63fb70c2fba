//! One open corpus plus the collaborators that feed and query it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use docqa_core::chunker::Chunker;
use docqa_core::config::{Config, Settings};
use docqa_core::sources::load_document;
use docqa_core::traits::{AnswerGenerator, Embedder, TextExtractor};
use docqa_core::types::SourceDocument;
use docqa_core::{Error, Result};
use docqa_vector::{Corpus, SnapshotStore};

use crate::extract::AutoExtractor;
use crate::generator::OpenAiGenerator;
use crate::ingest::{DocumentOutcome, DocumentReport, IngestPipeline, IngestProgress, IngestReport};
use crate::retrieval::{self, QueryResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub data_dir: PathBuf,
    pub chunks: usize,
    pub documents: BTreeSet<String>,
    pub dimension: Option<usize>,
}

pub struct RagSession {
    settings: Settings,
    chunker: Chunker,
    corpus: Corpus,
    store: SnapshotStore,
    embedder: Box<dyn Embedder>,
    extractor: Box<dyn TextExtractor>,
    generator: Box<dyn AnswerGenerator>,
}

impl RagSession {
    /// Build the default collaborators from `config` and restore the snapshot
    /// under its data directory.
    pub fn init(config: &Config) -> Result<Self> {
        let settings = config.settings()?;
        let embedder = docqa_embed::get_default_embedder(&settings.embedding)
            .map_err(|e| Error::embedding(format!("{e:#}")))?;
        let generator = OpenAiGenerator::new(&settings.generator)?;
        let store = SnapshotStore::new(config.data_dir()?);
        Self::with_components(settings, store, embedder, Box::new(AutoExtractor::new()), Box::new(generator))
    }

    pub fn with_components(
        settings: Settings,
        store: SnapshotStore,
        embedder: Box<dyn Embedder>,
        extractor: Box<dyn TextExtractor>,
        generator: Box<dyn AnswerGenerator>,
    ) -> Result<Self> {
        settings.validate()?;
        let corpus = store.load()?;
        if let Some(dim) = corpus.dimension() {
            if dim != embedder.dim() {
                warn!(stored = dim, embedder = embedder.dim(), "snapshot dimension differs from embedder; queries will fail until reset");
            }
        }
        info!(dir = %store.dir().display(), chunks = corpus.len(), "session ready");
        Ok(Self { chunker: Chunker::new(settings.chunking.clone()), settings, corpus, store, embedder, extractor, generator })
    }

    pub fn ingest(&mut self, documents: &[SourceDocument], progress: &dyn IngestProgress) -> Result<IngestReport> {
        let pipeline = IngestPipeline { chunker: &self.chunker, extractor: self.extractor.as_ref(), embedder: self.embedder.as_ref() };
        pipeline.run(&mut self.corpus, &self.store, documents, progress)
    }

    /// Read files from disk and ingest them. Unreadable files are reported as
    /// failed documents; `documents` in the report follows the order of `paths`.
    pub fn ingest_paths(&mut self, paths: &[PathBuf], progress: &dyn IngestProgress) -> Result<IngestReport> {
        let mut documents = Vec::with_capacity(paths.len());
        // one slot per path: `Some` for an unreadable file, `None` for one handed to the pipeline
        let mut slots: Vec<Option<DocumentReport>> = Vec::with_capacity(paths.len());
        for path in paths {
            match load_document(path) {
                Ok(doc) => {
                    documents.push(doc);
                    slots.push(None);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read document");
                    let report = DocumentReport { name: display_name(path), outcome: DocumentOutcome::Failed { reason: e.to_string() } };
                    progress.document_done(&report);
                    slots.push(Some(report));
                }
            }
        }
        let mut report = self.ingest(&documents, progress)?;
        let mut ingested = std::mem::take(&mut report.documents).into_iter();
        report.documents = slots.into_iter().filter_map(|slot| slot.or_else(|| ingested.next())).collect();
        Ok(report)
    }

    pub fn ask(&self, question: &str) -> Result<QueryResponse> {
        self.ask_with_top_k(question, self.settings.retrieval.top_k)
    }

    pub fn ask_with_top_k(&self, question: &str, top_k: usize) -> Result<QueryResponse> {
        retrieval::answer(&self.corpus, self.embedder.as_ref(), self.generator.as_ref(), question, top_k)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            data_dir: self.store.dir().to_path_buf(),
            chunks: self.corpus.len(),
            documents: self.corpus.distinct_sources(),
            dimension: self.corpus.dimension(),
        }
    }

    /// Drop every chunk in memory and on disk. Ids restart at 0.
    pub fn reset(&mut self) -> Result<()> {
        self.corpus.reset();
        self.store.clear()?;
        info!(dir = %self.store.dir().display(), "corpus reset");
        Ok(())
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn settings(&self) -> &Settings { &self.settings }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
