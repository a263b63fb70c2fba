//! On-disk snapshot of a [`Corpus`].
//!
//! Layout under the store directory:
//!
//! ```text
//! CURRENT                 name of the live generation, e.g. `snap-00000003`
//! snap-00000003/          vector_db.index, chunks.json, metadata.json
//! ```
//!
//! A save writes all three files into a fresh staging directory, fsyncs them,
//! renames the directory to the next generation and only then swaps `CURRENT`
//! through a temp file rename. That swap is the single commit point: a save
//! that dies earlier leaves the previous generation live and loadable.
//! Superseded generations are pruned after the swap.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use docqa_core::types::ChunkMetadata;
use docqa_core::{Error, Result};

use crate::corpus::Corpus;
use crate::index::FlatIndex;
use crate::registry::Registry;

pub const INDEX_FILE: &str = "vector_db.index";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const CURRENT_FILE: &str = "CURRENT";

const SNAPSHOT_FILES: [&str; 3] = [INDEX_FILE, CHUNKS_FILE, METADATA_FILE];
const GENERATION_PREFIX: &str = "snap-";
const STAGING_PREFIX: &str = ".staging-";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// True once a snapshot has been committed.
    pub fn exists(&self) -> bool {
        self.dir.join(CURRENT_FILE).exists()
    }

    /// Directory of the live generation, if any.
    pub fn current_dir(&self) -> Result<Option<PathBuf>> {
        let pointer = self.dir.join(CURRENT_FILE);
        let raw = match fs::read_to_string(&pointer) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let name = raw.trim();
        if parse_generation(name).is_none() {
            return Err(Error::snapshot(format!("{CURRENT_FILE} names an invalid generation '{name}'")));
        }
        Ok(Some(self.dir.join(name)))
    }

    pub fn save(&self, corpus: &Corpus) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| persistence(&self.dir, e))?;

        let index_bytes = corpus.index().serialize();
        let chunk_bytes = serde_json::to_vec(&corpus.registry().texts())?;
        let meta_bytes = serde_json::to_vec_pretty(&corpus.registry().metadata())?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.dir)
            .map_err(|e| persistence(&self.dir, e))?;
        for (name, bytes) in [(INDEX_FILE, &index_bytes), (CHUNKS_FILE, &chunk_bytes), (METADATA_FILE, &meta_bytes)] {
            write_synced(&staging.path().join(name), bytes)?;
        }
        sync_dir(staging.path())?;

        let generation = self.next_generation()?;
        let name = generation_name(generation);
        let target = self.dir.join(&name);
        fs::rename(staging.path(), &target).map_err(|e| persistence(&target, e))?;
        // the guard now points at a vanished path, dropping it removes nothing
        drop(staging);

        self.write_pointer(&name)?;
        self.prune(generation);
        info!(dir = %self.dir.display(), generation = %name, chunks = corpus.len(), "snapshot saved");
        Ok(())
    }

    /// Load the live generation. No committed snapshot yields an empty corpus.
    pub fn load(&self) -> Result<Corpus> {
        let Some(generation_dir) = self.current_dir()? else {
            debug!(dir = %self.dir.display(), "no snapshot found; starting empty");
            return Ok(Corpus::new());
        };
        if !generation_dir.is_dir() {
            return Err(Error::snapshot(format!("{CURRENT_FILE} points to missing {}", generation_dir.display())));
        }
        let missing: Vec<&str> = SNAPSHOT_FILES.iter().copied().filter(|f| !generation_dir.join(f).exists()).collect();
        if !missing.is_empty() {
            return Err(Error::snapshot(format!("incomplete snapshot, missing {}", missing.join(", "))));
        }

        let index = FlatIndex::deserialize(&fs::read(generation_dir.join(INDEX_FILE))?)?;
        let texts: Vec<String> = serde_json::from_slice(&fs::read(generation_dir.join(CHUNKS_FILE))?)
            .map_err(|e| Error::snapshot(format!("{CHUNKS_FILE}: {e}")))?;
        let metadata: Vec<ChunkMetadata> = serde_json::from_slice(&fs::read(generation_dir.join(METADATA_FILE))?)
            .map_err(|e| Error::snapshot(format!("{METADATA_FILE}: {e}")))?;

        let corpus = Corpus::from_parts(index, Registry::from_parts(texts, metadata)?)?;
        info!(dir = %generation_dir.display(), chunks = corpus.len(), "snapshot loaded");
        Ok(corpus)
    }

    /// Remove the pointer, then every generation and staging leftover.
    pub fn clear(&self) -> Result<()> {
        let pointer = self.dir.join(CURRENT_FILE);
        match fs::remove_file(&pointer) {
            Ok(()) => debug!(path = %pointer.display(), "removed snapshot pointer"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(persistence(&pointer, e)),
        }
        for path in self.snapshot_dirs(None)? {
            fs::remove_dir_all(&path).map_err(|e| persistence(&path, e))?;
        }
        Ok(())
    }

    /// One past the highest generation on disk, committed or not.
    fn next_generation(&self) -> Result<u64> {
        let entries = fs::read_dir(&self.dir).map_err(|e| persistence(&self.dir, e))?;
        let highest = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| parse_generation(&entry.file_name().to_string_lossy()))
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }

    fn write_pointer(&self, generation: &str) -> Result<()> {
        let pointer = self.dir.join(CURRENT_FILE);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| persistence(&pointer, e))?;
        writeln!(tmp, "{generation}").map_err(|e| persistence(&pointer, e))?;
        tmp.as_file().sync_all().map_err(|e| persistence(&pointer, e))?;
        tmp.persist(&pointer).map_err(|e| persistence(&pointer, e.error))?;
        sync_dir(&self.dir)
    }

    /// Generation and staging directories, except generation `keep`.
    fn snapshot_dirs(&self, keep: Option<u64>) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence(&self.dir, e)),
        };
        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                match parse_generation(&name) {
                    Some(generation) => Some(generation) != keep,
                    None => name.starts_with(STAGING_PREFIX),
                }
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect())
    }

    fn prune(&self, keep: u64) {
        let stale = match self.snapshot_dirs(Some(keep)) {
            Ok(stale) => stale,
            Err(e) => {
                warn!(error = %e, "could not list superseded snapshots");
                return;
            }
        };
        for path in stale {
            match fs::remove_dir_all(&path) {
                Ok(()) => debug!(path = %path.display(), "pruned superseded snapshot"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not prune superseded snapshot"),
            }
        }
    }
}

fn generation_name(generation: u64) -> String {
    format!("{GENERATION_PREFIX}{generation:08}")
}

fn parse_generation(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(GENERATION_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| persistence(path, e))?;
    file.write_all(bytes).map_err(|e| persistence(path, e))?;
    file.sync_all().map_err(|e| persistence(path, e))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir).and_then(|d| d.sync_all()).map_err(|e| persistence(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

fn persistence(path: &Path, e: std::io::Error) -> Error {
    Error::Persistence(format!("{}: {}", path.display(), e))
}
