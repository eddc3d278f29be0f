//! Question answering over the current index: retrieve, prompt, generate

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{Providers, VectorSearchResult};

/// Retriever, prompt and model bound to one built index
pub struct QaChain {
    providers: Providers,
    top_k: usize,
}

impl QaChain {
    /// Create a chain retrieving `top_k` chunks per question
    pub fn new(providers: Providers, top_k: usize) -> Self {
        Self {
            providers,
            top_k: top_k.max(1),
        }
    }

    /// Number of chunks retrieved per question
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed the question and fetch the most similar chunks
    pub async fn retrieve(&self, question: &str) -> Result<Vec<VectorSearchResult>> {
        let embedding = self.providers.embedder.embed(question).await?;
        self.providers.store.search(&embedding, self.top_k).await
    }

    /// Answer a question from retrieved context, returning the model's raw text
    pub async fn invoke(&self, question: &str) -> Result<String> {
        let results = self.retrieve(question).await?;
        tracing::debug!(
            "Retrieved {} chunks for question ({} chars)",
            results.len(),
            question.len()
        );

        let context = PromptBuilder::format_docs(&results);
        let prompt = PromptBuilder::build(question, &context);

        let answer = self.providers.llm.generate(&prompt).await?;
        tracing::info!(
            "Answered question with {} ({} chars)",
            self.providers.llm.model(),
            answer.len()
        );

        Ok(answer)
    }
}
