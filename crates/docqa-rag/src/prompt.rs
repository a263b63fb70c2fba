use docqa_core::types::CitedChunk;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that answers questions based only on the provided document context.";

/// Retrieved chunk texts in rank order, separated by blank lines.
pub fn build_context(chunks: &[CitedChunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following context from the uploaded documents, answer the user's question. \
         If the answer cannot be found in the context, say so clearly.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}
