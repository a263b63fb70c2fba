//! Paragraph-first chunking with a sentence-level fallback for long paragraphs.
//!
//! Lengths are measured in `char`s. Paragraphs are separated by blank lines;
//! paragraphs shorter than `min_chars` are dropped, paragraphs up to
//! `max_chars` are emitted as-is and longer ones are packed sentence by
//! sentence into chunks below `max_chars`. A single sentence longer than
//! `max_chars` is never cut.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ChunkDraft;

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line pattern"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { min_chars: 50, max_chars: 1000 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str, source_document: &str) -> Vec<ChunkDraft> {
        let normalized = BLANK_LINES.replace_all(text, "\n\n");
        let mut drafts = Vec::new();
        for paragraph in normalized.split("\n\n") {
            let paragraph = paragraph.trim();
            let len = paragraph.chars().count();
            if len < self.config.min_chars {
                continue;
            }
            if len <= self.config.max_chars {
                drafts.push(draft(paragraph, source_document));
            } else {
                // the minimum applies to paragraphs only; every packed piece is kept
                drafts.extend(self.pack_sentences(paragraph).iter().map(|piece| draft(piece, source_document)));
            }
        }
        debug!(source_document, chunks = drafts.len(), "chunked document");
        drafts
    }

    /// Greedy packing: a buffer is closed as soon as the next sentence would
    /// bring it to `max_chars` or beyond.
    fn pack_sentences(&self, paragraph: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut buffer = String::new();
        let mut buffer_len = 0usize;
        for sentence in split_sentences(paragraph) {
            let sentence_len = sentence.chars().count();
            if buffer_len + sentence_len < self.config.max_chars {
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_len += sentence_len + 1;
            } else {
                if !buffer.is_empty() {
                    pieces.push(buffer.trim().to_string());
                }
                buffer.clear();
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_len = sentence_len + 1;
            }
        }
        let tail = buffer.trim();
        if !tail.is_empty() {
            pieces.push(tail.to_string());
        }
        pieces
    }
}

/// Split after `.`, `!` or `?` when followed by whitespace; the whitespace is
/// consumed as the separator.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    for boundary in SENTENCE_END.find_iter(paragraph) {
        // terminators are single-byte ASCII
        sentences.push(&paragraph[start..=boundary.start()]);
        start = boundary.end();
    }
    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }
    sentences
}

fn draft(text: &str, source_document: &str) -> ChunkDraft {
    ChunkDraft { text: text.to_string(), source_document: source_document.to_string() }
}
