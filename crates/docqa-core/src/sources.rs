//! Discovery and loading of source documents from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::SourceDocument;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Expand each input into document paths: files are taken as given, directories
/// are walked recursively for supported extensions. Output is sorted per
/// directory and deduplicated, preserving input order across arguments.
pub fn collect_document_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for path in list_supported_files(input) {
                if !out.contains(&path) { out.push(path); }
            }
        } else if input.is_file() {
            if !out.contains(input) { out.push(input.clone()); }
        } else {
            warn!(path = %input.display(), "skipping missing input");
        }
    }
    out
}

fn list_supported_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
        if ext.as_deref().is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e)) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    debug!(root = %root.display(), found = files.len(), "listed documents");
    files
}

/// Read a document; its name is the file name without directories.
pub fn load_document(path: &Path) -> Result<SourceDocument> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string());
    Ok(SourceDocument { name, bytes })
}
