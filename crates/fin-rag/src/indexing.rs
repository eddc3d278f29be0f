//! Full index rebuild from the documents directory

use crate::chain::QaChain;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::{DocumentLoader, TextChunker};
use crate::providers::Providers;

/// Rebuilds the vector index from every document on disk
pub struct IndexBuilder {
    loader: DocumentLoader,
    chunker: TextChunker,
    providers: Providers,
    top_k: usize,
}

impl IndexBuilder {
    /// Create a builder from configuration
    pub fn new(config: &RagConfig, providers: Providers) -> Self {
        Self {
            loader: DocumentLoader::new(&config.documents.dir),
            chunker: TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            providers,
            top_k: config.retrieval.top_k,
        }
    }

    /// Load, chunk, embed and upsert everything, then return a chain over the index.
    ///
    /// Returns `None` when there is nothing to index; the caller keeps whatever
    /// chain it already has.
    pub async fn rebuild(&self) -> Result<Option<QaChain>> {
        let documents = self.loader.load_async().await?;
        if documents.is_empty() {
            tracing::info!("No documents in {}, index unchanged", self.loader.dir().display());
            return Ok(None);
        }

        let mut chunks = self.chunker.chunk_documents(&documents);
        if chunks.is_empty() {
            tracing::info!("Documents produced no chunks, index unchanged");
            return Ok(None);
        }

        tracing::info!(
            "Indexing {} chunks from {} page records",
            chunks.len(),
            documents.len()
        );

        let embedder = &self.providers.embedder;
        self.providers.store.ensure_index(embedder.dimensions()).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let written = self.providers.store.upsert(&chunks).await?;
        tracing::info!("Upserted {} vectors into {}", written, self.providers.store.name());

        Ok(Some(QaChain::new(self.providers.clone(), self.top_k)))
    }
}
