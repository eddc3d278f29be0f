//! Provider abstractions for embeddings, LLM and vector storage
//!
//! The QA chain only sees these traits; Gemini and Pinecone are the hosted
//! backends wired up by the server binary.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod pinecone;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
pub use pinecone::PineconeStore;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;

/// The three hosted services a QA chain talks to
#[derive(Clone)]
pub struct Providers {
    /// Embedding provider
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Vector store provider
    pub store: Arc<dyn VectorStoreProvider>,
    /// LLM provider
    pub llm: Arc<dyn LlmProvider>,
}

impl Providers {
    /// Bundle explicit providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self { embedder, store, llm }
    }

    /// Gemini for embeddings and generation, Pinecone for vectors.
    ///
    /// Fails with a configuration error when either API key is missing.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(&config.gemini, config.google_api_key()?)?);
        let pinecone = Arc::new(PineconeStore::new(&config.pinecone, config.pinecone_api_key()?)?);

        tracing::info!(
            "Providers initialized (embedding: {}, llm: {}, index: {})",
            config.gemini.embed_model,
            config.gemini.generate_model,
            config.pinecone.index_name
        );

        Ok(Self {
            embedder: gemini.clone(),
            store: pinecone,
            llm: gemini,
        })
    }
}
