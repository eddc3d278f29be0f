//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Chunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk (embedding left empty)
    pub chunk: Chunk,
    /// Similarity score reported by the store, higher is more similar
    pub similarity: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `PineconeStore`: hosted Pinecone serverless index
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Make sure the index exists, creating it with `dimensions` when missing
    async fn ensure_index(&self, dimensions: usize) -> Result<()>;

    /// Insert or overwrite chunks by ID. Chunks must carry their embeddings.
    ///
    /// Returns the number of vectors written.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize>;

    /// Search for the `top_k` chunks most similar to `query_embedding`
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
