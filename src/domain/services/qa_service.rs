use std::sync::Arc;

use crate::domain::models::qa::SourceChunk;
use crate::domain::ports::{LlmService, VectorIndex};
use crate::error::AppError;

/// Number of chunks retrieved per question.
pub const TOP_K: usize = 5;

const ANSWER_INSTRUCTION: &str = "You are an assistant answering questions about transcribed audio recordings. \
Answer using only the transcript excerpts below. \
If the excerpts do not contain the answer, say so plainly instead of guessing.";

pub struct QaService {
    llm: Arc<dyn LlmService>,
    vector_index: Arc<dyn VectorIndex>,
}

impl QaService {
    pub fn new(llm: Arc<dyn LlmService>, vector_index: Arc<dyn VectorIndex>) -> Self {
        Self { llm, vector_index }
    }

    /// Embed the question and fetch the top-k nearest chunks across the
    /// whole corpus. Results arrive in descending-score order and are
    /// used as returned.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SourceChunk>, AppError> {
        let vector = self.llm.embed(question).await?;
        self.vector_index.query(&vector, TOP_K).await
    }

    /// Fixed instruction prefix, retrieved excerpts in index order, then
    /// the literal question.
    pub fn build_prompt(chunks: &[SourceChunk], question: &str) -> String {
        let mut prompt = String::from(ANSWER_INSTRUCTION);
        prompt.push_str("\n\nTranscript excerpts:\n");

        if chunks.is_empty() {
            prompt.push_str("(no matching excerpts were found)\n");
        } else {
            for chunk in chunks {
                prompt.push_str(&chunk.text);
                prompt.push_str("\n\n");
            }
        }

        prompt.push_str(&format!("Question: {question}\nAnswer:"));
        prompt
    }
}
