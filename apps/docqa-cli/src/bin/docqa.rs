use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docqa_core::config::Config;
use docqa_core::sources::collect_document_paths;
use docqa_rag::{DocumentOutcome, DocumentReport, IngestProgress, IngestStage, RagSession};
use docqa_vector::SnapshotStore;

#[derive(Parser)]
#[command(name = "docqa", version, about = "Ask questions about your documents")]
struct Cli {
    /// Debug logging for the docqa crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index PDF, text and markdown files (directories are searched recursively)
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Answer a question from the indexed documents
    Ask {
        question: String,
        /// Number of chunks used as context
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show what is indexed
    Status,
    /// Delete every indexed chunk and the snapshot on disk
    Reset,
}

struct BarProgress(ProgressBar);

impl IngestProgress for BarProgress {
    fn stage(&self, stage: IngestStage) {
        self.0.set_message(stage.to_string());
    }

    fn document_done(&self, report: &DocumentReport) {
        self.0.inc(1);
        if let DocumentOutcome::Failed { reason } = &report.outcome {
            self.0.println(format!("⚠️  {}: {}", report.name, reason));
        }
    }
}

fn open_session(config: &Config) -> anyhow::Result<RagSession> {
    RagSession::init(config).context("failed to open document store")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "docqa=debug,docqa_core=debug,docqa_vector=debug,docqa_rag=debug,docqa_embed=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    match cli.command {
        Command::Ingest { paths } => {
            let mut session = open_session(&config)?;
            let files = collect_document_paths(&paths);
            if files.is_empty() {
                println!("No .pdf, .txt or .md files found.");
                return Ok(());
            }
            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
                    .progress_chars("#>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            let report = session.ingest_paths(&files, &BarProgress(pb.clone()))?;
            pb.finish_and_clear();

            let failed = report.failed().count();
            match report.stage {
                IngestStage::Idle => println!("No content found in documents ({} failed).", failed),
                _ => println!("✅ Indexed {} chunks from {} documents ({} failed).", report.chunks_added(), report.documents.len() - failed, failed),
            }
            if let Some(err) = &report.persist_error {
                eprintln!("⚠️  Indexed chunks were not saved to disk: {}", err);
            }
        }
        Command::Ask { question, top_k } => {
            let session = open_session(&config)?;
            let response = match top_k {
                Some(k) => session.ask_with_top_k(&question, k)?,
                None => session.ask(&question)?,
            };
            println!("{}", response.message());
            if !response.citations.is_empty() {
                println!("\nSources:");
                for (rank, c) in response.citations.iter().enumerate() {
                    let preview: String = c.text.chars().take(160).collect();
                    println!("  {}. {} (chunk {}, distance {:.4})", rank + 1, c.source_document, c.id, c.distance);
                    println!("     {}", preview.replace('\n', " "));
                }
            }
        }
        Command::Status => {
            // no embedder needed to inspect the snapshot
            let store = SnapshotStore::new(config.data_dir()?);
            let corpus = store.load()?;
            println!("Data directory: {}", store.dir().display());
            println!("Chunks: {}", corpus.len());
            match corpus.dimension() {
                Some(d) => println!("Vector dimension: {}", d),
                None => println!("Vector dimension: (empty index)"),
            }
            let documents = corpus.distinct_sources();
            println!("Documents: {}", documents.len());
            for doc in &documents { println!("  {}", doc); }
        }
        Command::Reset => {
            SnapshotStore::new(config.data_dir()?).clear()?;
            println!("🗑️  Cleared all indexed documents.");
        }
    }
    Ok(())
}
