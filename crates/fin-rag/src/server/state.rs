//! Application state for the QA server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::acquisition::DocumentStore;
use crate::chain::QaChain;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::indexing::IndexBuilder;
use crate::providers::Providers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Documents directory and downloader
    documents: DocumentStore,
    /// Rebuilds the index from the documents directory
    index_builder: IndexBuilder,
    /// Chain over the most recent successful build, `None` until the first one
    chain: RwLock<Option<Arc<QaChain>>>,
    /// Serializes rebuilds so concurrent ingestions never interleave
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    /// Create application state backed by Gemini and Pinecone
    pub fn new(config: RagConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Self::with_providers(config, providers)
    }

    /// Create application state with explicit providers
    pub fn with_providers(config: RagConfig, providers: Providers) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let documents = DocumentStore::new(&config.documents)?;
        tracing::info!("Documents directory: {}", documents.dir().display());

        let index_builder = IndexBuilder::new(&config, providers);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                documents,
                index_builder,
                chain: RwLock::new(None),
                rebuild_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the document store
    pub fn documents(&self) -> &DocumentStore {
        &self.inner.documents
    }

    /// Chain over the current index, if one has been built
    pub fn current_chain(&self) -> Option<Arc<QaChain>> {
        self.inner.chain.read().clone()
    }

    /// Whether a question can be answered yet
    pub fn has_index(&self) -> bool {
        self.inner.chain.read().is_some()
    }

    /// Rebuild the index from every document on disk and swap in the new chain.
    ///
    /// Returns `false` when there was nothing to index; the previous chain stays
    /// in place in that case and when the rebuild fails.
    pub async fn rebuild_index(&self) -> Result<bool> {
        let _guard = self.inner.rebuild_lock.lock().await;

        match self.inner.index_builder.rebuild().await? {
            Some(chain) => {
                *self.inner.chain.write() = Some(Arc::new(chain));
                tracing::info!("QA chain updated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Answer a question against the current index.
    ///
    /// Any failure past the index check is reported verbatim as a pipeline error.
    pub async fn answer(&self, question: &str) -> Result<String> {
        let chain = self.current_chain().ok_or(Error::NoIndex)?;
        chain.invoke(question).await.map_err(Error::pipeline)
    }
}
