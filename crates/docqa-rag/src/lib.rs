//! docqa-rag
//!
//! Document ingestion and retrieval-augmented answering over a
//! [`docqa_vector::Corpus`]: text extraction, the ingest pipeline, retrieval
//! with grounded generation, and the [`RagSession`] that ties them together.

pub mod extract;
pub mod generator;
pub mod ingest;
pub mod prompt;
pub mod retrieval;
pub mod session;

pub use extract::{AutoExtractor, PdfExtractor, PlainTextExtractor};
pub use generator::OpenAiGenerator;
pub use ingest::{DocumentOutcome, DocumentReport, IngestPipeline, IngestProgress, IngestReport, IngestStage};
pub use retrieval::{GenerationFailure, QueryOutcome, QueryResponse};
pub use session::{RagSession, SessionStatus};
