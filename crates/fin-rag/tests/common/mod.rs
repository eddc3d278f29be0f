//! In-process stand-ins for the hosted services, plus fixture helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fin_rag::config::RagConfig;
use fin_rag::error::{Error, Result};
use fin_rag::providers::{
    EmbeddingProvider, LlmProvider, Providers, VectorSearchResult, VectorStoreProvider,
};
use fin_rag::types::Chunk;

pub const DIM: usize = 26;

/// Letter-frequency embedding: similar wording gives similar vectors
pub struct LetterEmbedder;

fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
        v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(letter_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// Brute-force cosine store keyed by chunk ID
#[derive(Default)]
pub struct MemoryStore {
    vectors: Mutex<BTreeMap<String, Chunk>>,
    pub ensured_dims: Mutex<Option<usize>>,
    pub upserts: AtomicUsize,
    in_flight: AtomicUsize,
    /// Most upserts ever running at the same time
    pub max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.vectors.lock().len()
    }
}

#[async_trait]
impl VectorStoreProvider for MemoryStore {
    async fn ensure_index(&self, dimensions: usize) -> Result<()> {
        *self.ensured_dims.lock() = Some(dimensions);
        Ok(())
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        // Hold the write open long enough for an unserialized caller to overlap
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut vectors = self.vectors.lock();
        for chunk in chunks {
            if chunk.embedding.len() != DIM {
                return Err(Error::vector_db("wrong dimension"));
            }
            vectors.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let vectors = self.vectors.lock();
        let mut results: Vec<VectorSearchResult> = vectors
            .values()
            .map(|chunk| VectorSearchResult {
                similarity: chunk
                    .embedding
                    .iter()
                    .zip(query_embedding)
                    .map(|(a, b)| a * b)
                    .sum(),
                chunk: chunk.clone(),
            })
            .collect();
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        Ok(results)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Answers with the context section of the prompt it receives
#[derive(Default)]
pub struct ContextEchoLlm {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for ContextEchoLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        let context = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.split_once("\n\nQuestion:"))
            .map(|(context, _)| context)
            .unwrap_or_default();
        Ok(format!("**Answer:** {}", context))
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-1"
    }
}

/// Always fails, like a model endpoint with an exhausted quota
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::llm("Gemini generation failed (429): quota exceeded"))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-1"
    }
}

pub struct Harness {
    pub providers: Providers,
    pub store: Arc<MemoryStore>,
    pub llm: Arc<ContextEchoLlm>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let llm = Arc::new(ContextEchoLlm::default());
    Harness {
        providers: Providers::new(Arc::new(LetterEmbedder), store.clone(), llm.clone()),
        store,
        llm,
    }
}

pub fn test_config(dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.documents.dir = dir.to_path_buf();
    config.documents.download_timeout_secs = 5;
    config
}

/// A DOCX containing one paragraph per line
pub fn docx_bytes(lines: &[&str]) -> Vec<u8> {
    let mut docx = docx_rs::Docx::new();
    for line in lines {
        docx = docx.add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*line)));
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    docx.build().pack(&mut buf).unwrap();
    buf.into_inner()
}
