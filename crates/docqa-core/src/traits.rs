use crate::error::Result;
use crate::types::PageText;

/// Converts raw document bytes into ordered page texts.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document_name: &str, bytes: &[u8]) -> Result<Vec<PageText>>;
}

/// Maps a non-empty batch of strings to vectors of a fixed dimension, same
/// length and order as the input.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Remote answer generation. Fails with `Error::Credential` when no key is
/// configured and `Error::Service` on any remote failure or timeout.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, system_instruction: &str, user_prompt: &str) -> Result<String>;
}
