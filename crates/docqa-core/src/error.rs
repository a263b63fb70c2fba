use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to extract text from '{document}': {message}")]
    Extraction { document: String, message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("No chunk at index position {0}")]
    NotFound(usize),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Missing credential: {0}")]
    Credential(String),

    #[error("Generation service error: {0}")]
    Service(String),

    #[error("Failed to persist snapshot: {0}")]
    Persistence(String),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn extraction(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction { document: document.into(), message: message.into() }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot(message.into())
    }

    /// Errors raised by the answer generator; these are rendered as answer
    /// text instead of aborting a query.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::Credential(_) | Self::Service(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
