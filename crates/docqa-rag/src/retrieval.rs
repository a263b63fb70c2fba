//! Query → nearest chunks → grounded answer.

use std::fmt;

use tracing::{debug, info, warn};

use docqa_core::traits::{AnswerGenerator, Embedder};
use docqa_core::types::CitedChunk;
use docqa_core::{Error, Result};
use docqa_vector::Corpus;

use crate::prompt::{build_context, build_prompt, SYSTEM_INSTRUCTION};

pub const MISSING_KEY_MESSAGE: &str = "Please set your OpenAI API key to generate answers.";
pub const NO_CONTENT_MESSAGE: &str = "No relevant content found for your query.";
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a question.";

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    MissingCredential,
    Service(String),
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => f.write_str(MISSING_KEY_MESSAGE),
            Self::Service(reason) => write!(f, "Error generating answer: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    EmptyQuery,
    NoRelevantContent,
    Answered(String),
    GenerationFailed(GenerationFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub outcome: QueryOutcome,
    /// Chunks used as context, nearest first. Kept even when generation fails.
    pub citations: Vec<CitedChunk>,
}

impl QueryResponse {
    fn without_citations(outcome: QueryOutcome) -> Self {
        Self { outcome, citations: Vec::new() }
    }

    /// User-visible text for any outcome.
    pub fn message(&self) -> String {
        match &self.outcome {
            QueryOutcome::EmptyQuery => EMPTY_QUERY_MESSAGE.to_string(),
            QueryOutcome::NoRelevantContent => NO_CONTENT_MESSAGE.to_string(),
            QueryOutcome::Answered(text) => text.clone(),
            QueryOutcome::GenerationFailed(failure) => failure.to_string(),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Answered(_))
    }
}

/// Embed `question` and resolve its `top_k` nearest chunks.
pub fn retrieve(corpus: &Corpus, embedder: &dyn Embedder, question: &str, top_k: usize) -> Result<Vec<CitedChunk>> {
    let query_vector = embedder
        .embed_batch(&[question.to_string()])?
        .pop()
        .ok_or_else(|| Error::embedding("embedder returned no vector for the query"))?;
    let hits = corpus.search(&query_vector, top_k)?;
    let cited = corpus.resolve(&hits);
    if cited.len() < hits.len() {
        warn!(hits = hits.len(), resolved = cited.len(), "dropped unresolvable search hits");
    }
    debug!(top_k, found = cited.len(), "retrieved context");
    Ok(cited)
}

/// Answer `question` from the corpus. Generator credential and service
/// failures become [`QueryOutcome::GenerationFailed`]; any other error is returned.
pub fn answer(
    corpus: &Corpus,
    embedder: &dyn Embedder,
    generator: &dyn AnswerGenerator,
    question: &str,
    top_k: usize,
) -> Result<QueryResponse> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(QueryResponse::without_citations(QueryOutcome::EmptyQuery));
    }
    let citations = retrieve(corpus, embedder, question, top_k)?;
    if citations.is_empty() {
        info!("no relevant content for query");
        return Ok(QueryResponse::without_citations(QueryOutcome::NoRelevantContent));
    }

    let prompt = build_prompt(question, &build_context(&citations));
    let outcome = match generator.generate(SYSTEM_INSTRUCTION, &prompt) {
        Ok(text) => QueryOutcome::Answered(text),
        Err(Error::Credential(reason)) => {
            warn!(%reason, "answer generation skipped");
            QueryOutcome::GenerationFailed(GenerationFailure::MissingCredential)
        }
        Err(Error::Service(reason)) => {
            warn!(%reason, "answer generation failed");
            QueryOutcome::GenerationFailed(GenerationFailure::Service(reason))
        }
        Err(e) => return Err(e),
    };
    Ok(QueryResponse { outcome, citations })
}
