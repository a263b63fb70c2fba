use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docqa_core::config::Settings;
use docqa_core::traits::{AnswerGenerator, Embedder, TextExtractor};
use docqa_core::types::{PageText, SourceDocument};
use docqa_core::{Error, Result};
use docqa_embed::HashEmbedder;
use docqa_rag::ingest::join_pages;
use docqa_rag::retrieval::{MISSING_KEY_MESSAGE, NO_CONTENT_MESSAGE};
use docqa_rag::{
    AutoExtractor, DocumentOutcome, GenerationFailure, IngestProgress, IngestStage, QueryOutcome, RagSession,
};
use docqa_vector::snapshot::{CHUNKS_FILE, INDEX_FILE, METADATA_FILE};
use docqa_vector::SnapshotStore;
use tempfile::TempDir;

const SOLAR: &str = "The solar array on the barn roof charges the battery bank every sunny afternoon. \
Each panel is rated at four hundred watts and the inverter sits in the pump house.";
const WELL: &str = "The well is forty meters deep and the submersible pump lifts water into a cistern. \
Check the pressure switch every spring before the garden irrigation starts.";
const CELLAR: &str = "Seed potatoes keep best in the root cellar at four degrees with no light at all. \
Turn the crates once a month and remove anything that has started to soften.";

#[derive(Clone, Default)]
struct RecordingGenerator {
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl AnswerGenerator for RecordingGenerator {
    fn generate(&self, _system_instruction: &str, user_prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_prompt.lock() {
            *slot = Some(user_prompt.to_string());
        }
        Ok("The well is forty meters deep.".to_string())
    }
}

struct FailingGenerator(fn() -> Error);

impl AnswerGenerator for FailingGenerator {
    fn generate(&self, _: &str, _: &str) -> Result<String> { Err((self.0)()) }
}

fn fake_settings() -> Settings {
    let mut settings = Settings::default();
    settings.embedding.use_fake = true;
    settings
}

fn open(dir: &std::path::Path, generator: Box<dyn AnswerGenerator>) -> Result<RagSession> {
    open_with_dim(dir, generator, 384)
}

fn open_with_dim(dir: &std::path::Path, generator: Box<dyn AnswerGenerator>, dim: usize) -> Result<RagSession> {
    RagSession::with_components(
        fake_settings(),
        SnapshotStore::new(dir),
        Box::new(HashEmbedder::new(dim)),
        Box::new(AutoExtractor::new()),
        generator,
    )
}

fn docs() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new("power.txt", SOLAR),
        SourceDocument::new("water.md", WELL),
        SourceDocument::new("storage.txt", CELLAR),
    ]
}

#[test]
fn empty_corpus_answers_without_calling_generator() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let generator = RecordingGenerator::default();
    let session = open(tmp.path(), Box::new(generator.clone()))?;

    let response = session.ask("How deep is the well?")?;
    assert_eq!(response.outcome, QueryOutcome::NoRelevantContent);
    assert_eq!(response.message(), NO_CONTENT_MESSAGE);
    assert!(response.citations.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn blank_question_is_not_searched() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let generator = RecordingGenerator::default();
    let mut session = open(tmp.path(), Box::new(generator.clone()))?;
    session.ingest(&docs(), &())?;
    let response = session.ask("   \n")?;
    assert_eq!(response.outcome, QueryOutcome::EmptyQuery);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn ingest_then_ask_returns_grounded_answer() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let generator = RecordingGenerator::default();
    let mut session = open(tmp.path(), Box::new(generator.clone()))?;

    let report = session.ingest(&docs(), &())?;
    assert_eq!(report.stage, IngestStage::Persisted);
    assert_eq!(report.chunk_ids, vec![0, 1, 2]);
    assert!(report.persist_error.is_none());
    assert!(report.documents.iter().all(|d| d.outcome == DocumentOutcome::Ingested { chunks: 1 }));
    let live = SnapshotStore::new(tmp.path()).current_dir()?.expect("committed snapshot");
    for name in [INDEX_FILE, CHUNKS_FILE, METADATA_FILE] {
        assert!(live.join(name).exists(), "{name} missing");
    }

    let response = session.ask_with_top_k("how deep is the well pump water cistern", 2)?;
    assert!(response.is_answered());
    assert_eq!(response.message(), "The well is forty meters deep.");
    assert_eq!(response.citations.len(), 2);
    assert_eq!(response.citations[0].source_document, "water.md");
    assert!(response.citations[0].distance <= response.citations[1].distance);

    let prompt = generator.last_prompt.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone().unwrap_or_default();
    assert!(prompt.contains("forty meters deep"));
    assert!(prompt.contains("Question: how deep is the well pump water cistern"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn top_k_larger_than_corpus_returns_everything() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
    session.ingest(&docs()[..2], &())?;
    let response = session.ask_with_top_k("battery", 10)?;
    assert_eq!(response.citations.len(), 2);
    Ok(())
}

#[test]
fn missing_credential_is_rendered_as_answer_text() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let generator = FailingGenerator(|| Error::Credential("OpenAI API key is not set".into()));
    let mut session = open(tmp.path(), Box::new(generator))?;
    session.ingest(&docs(), &())?;

    let response = session.ask("Where is the inverter?")?;
    assert_eq!(response.outcome, QueryOutcome::GenerationFailed(GenerationFailure::MissingCredential));
    assert_eq!(response.message(), MISSING_KEY_MESSAGE);
    assert!(!response.citations.is_empty());
    Ok(())
}

#[test]
fn service_error_is_rendered_as_answer_text() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let mut session = open(tmp.path(), Box::new(FailingGenerator(|| Error::service("HTTP 503: overloaded"))))?;
    session.ingest(&docs(), &())?;
    let response = session.ask("Where is the inverter?")?;
    assert_eq!(response.message(), "Error generating answer: HTTP 503: overloaded");
    Ok(())
}

#[test]
fn failed_extraction_skips_only_that_document() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
    let mut batch = docs();
    batch.insert(1, SourceDocument::new("photo.png", vec![0x89, b'P', b'N', b'G']));

    let report = session.ingest(&batch, &())?;
    assert_eq!(report.chunks_added(), 3);
    let failed: Vec<&str> = report.failed().map(|d| d.name.as_str()).collect();
    assert_eq!(failed, vec!["photo.png"]);
    assert_eq!(session.status().documents.len(), 3);
    Ok(())
}

#[test]
fn batch_without_content_stays_idle() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
    let report = session.ingest(&[SourceDocument::new("tiny.txt", "Short.")], &())?;
    assert_eq!(report.stage, IngestStage::Idle);
    assert_eq!(report.documents[0].outcome, DocumentOutcome::NoContent);
    assert!(report.chunk_ids.is_empty());
    assert!(!SnapshotStore::new(tmp.path()).exists());
    Ok(())
}

#[test]
fn snapshot_survives_reopen_and_reset_restarts_ids() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    {
        let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
        session.ingest(&docs(), &())?;
    }
    let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
    let status = session.status();
    assert_eq!(status.chunks, 3);
    assert_eq!(status.dimension, Some(384));
    assert!(status.documents.contains("storage.txt"));

    session.reset()?;
    assert_eq!(session.status().chunks, 0);
    assert!(!SnapshotStore::new(tmp.path()).exists());
    let report = session.ingest(&docs()[2..], &())?;
    assert_eq!(report.chunk_ids, vec![0]);
    Ok(())
}

#[test]
fn dimension_change_aborts_batch_without_partial_state() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    {
        let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
        session.ingest(&docs()[..1], &())?;
    }
    let mut session = open_with_dim(tmp.path(), Box::new(RecordingGenerator::default()), 768)?;
    let err = session.ingest(&docs()[1..], &()).unwrap_err();
    assert!(matches!(err, Error::Dimension { expected: 384, actual: 768 }));
    assert_eq!(session.corpus().len(), 1);
    assert_eq!(session.corpus().index().len(), 1);
    assert_eq!(SnapshotStore::new(tmp.path()).load()?.len(), 1);
    Ok(())
}

#[test]
fn persist_failure_is_reported_after_commit() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let blocker = tmp.path().join("occupied");
    fs::write(&blocker, b"not a directory")?;
    let mut session = open(&blocker.join("data"), Box::new(RecordingGenerator::default()))?;

    let report = session.ingest(&docs(), &())?;
    assert_eq!(report.stage, IngestStage::Indexing);
    assert!(report.persist_error.is_some());
    assert_eq!(session.corpus().len(), 3);
    Ok(())
}

#[derive(Default)]
struct StageLog(Mutex<Vec<IngestStage>>);

impl IngestProgress for StageLog {
    fn stage(&self, stage: IngestStage) {
        if let Ok(mut v) = self.0.lock() { v.push(stage); }
    }
}

#[test]
fn progress_sees_stages_in_order() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let mut session = open(tmp.path(), Box::new(RecordingGenerator::default()))?;
    let log = StageLog::default();
    session.ingest(&docs()[..1], &log)?;
    let stages = log.0.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone();
    assert_eq!(
        stages,
        vec![IngestStage::Extracting, IngestStage::Chunking, IngestStage::Embedding, IngestStage::Indexing, IngestStage::Persisted]
    );
    Ok(())
}

#[test]
fn pages_are_joined_with_markers() {
    let pages = vec![
        PageText { page_number: 1, text: "first".into() },
        PageText { page_number: 2, text: "second".into() },
    ];
    assert_eq!(join_pages(&pages), "\n[PAGE 1]\nfirst\n\n[PAGE 2]\nsecond\n");
}

#[test]
fn extractor_dispatches_on_extension() -> anyhow::Result<()> {
    let extractor = AutoExtractor::new();
    let pages = extractor.extract("NOTES.MD", "# heading\nbody".as_bytes())?;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[0].text, "# heading\nbody");

    let lossy = extractor.extract("README", &[b'o', b'k', 0xff])?;
    assert!(lossy[0].text.starts_with("ok"));

    assert!(matches!(extractor.extract("sheet.xlsx", b"PK"), Err(Error::Extraction { .. })));
    assert!(matches!(extractor.extract("broken.pdf", b"definitely not a pdf"), Err(Error::Extraction { .. })));
    Ok(())
}

#[test]
fn hash_embedder_reports_its_dimension() {
    assert_eq!(HashEmbedder::new(384).dim(), 384);
}

#[test]
fn path_reports_follow_input_order() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let files = tmp.path().join("docs");
    fs::create_dir(&files)?;
    fs::write(files.join("power.txt"), SOLAR)?;
    fs::write(files.join("water.md"), WELL)?;
    let paths = vec![files.join("power.txt"), files.join("gone.txt"), files.join("water.md")];

    let mut session = open(&tmp.path().join("data"), Box::new(RecordingGenerator::default()))?;
    let report = session.ingest_paths(&paths, &())?;
    let names: Vec<&str> = report.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["power.txt", "gone.txt", "water.md"]);
    assert!(matches!(report.documents[1].outcome, DocumentOutcome::Failed { .. }));
    assert_eq!(report.chunk_ids, vec![0, 1]);
    Ok(())
}
