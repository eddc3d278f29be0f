//! Pinecone serverless vector store
//!
//! The control plane resolves (and if needed creates) the index and yields the
//! data-plane host; upserts and queries then go straight to that host. Chunk text
//! travels in vector metadata so search results need no local lookup.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::PineconeConfig;
use crate::error::{Error, Result};
use crate::providers::vector_store::{VectorSearchResult, VectorStoreProvider};
use crate::types::Chunk;

/// Poll interval while a freshly created index comes up
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Give up waiting for a new index after this many polls
const READY_MAX_POLLS: u32 = 60;

/// Pinecone vector store provider
pub struct PineconeStore {
    http: reqwest::Client,
    control_url: String,
    index_name: String,
    cloud: String,
    region: String,
    namespace: String,
    batch_size: usize,
    /// Data-plane host, resolved once
    host: OnceCell<String>,
}

impl PineconeStore {
    /// Create a new Pinecone store
    ///
    /// # Arguments
    /// * `config` - Index name, control plane URL and serverless placement
    /// * `api_key` - Pinecone API key sent as `Api-Key`
    pub fn new(config: &PineconeConfig, api_key: &str) -> Result<Self> {
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| Error::Config("PINECONE_API_KEY contains invalid characters".to_string()))?;
        let version = HeaderValue::from_str(&config.api_version)
            .map_err(|_| Error::Config(format!("Invalid Pinecone API version: {}", config.api_version)))?;
        let headers = HeaderMap::from_iter([
            (HeaderName::from_static("api-key"), key),
            (HeaderName::from_static("x-pinecone-api-version"), version),
        ]);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            control_url: config.control_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            cloud: config.cloud.clone(),
            region: config.region.clone(),
            namespace: config.namespace.clone(),
            batch_size: config.upsert_batch_size.max(1),
            host: OnceCell::new(),
        })
    }

    /// Data-plane base URL for the index, e.g. `https://langchain-abc123.svc.pinecone.io`
    fn data_url(host: &str, path: &str) -> String {
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}{}", host.trim_end_matches('/'), path)
        } else {
            format!("https://{}{}", host, path)
        }
    }

    /// Describe the index; `None` when it does not exist
    async fn describe_index(&self) -> Result<Option<IndexDescription>> {
        let response = self
            .http
            .get(format!("{}/indexes/{}", self.control_url, self.index_name))
            .send()
            .await
            .map_err(|e| Error::VectorDb(format!("Pinecone describe failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorDb(format!(
                "Pinecone describe failed ({}): {}",
                status, body
            )));
        }

        let description = response
            .json()
            .await
            .map_err(|e| Error::VectorDb(format!("Failed to parse Pinecone response: {}", e)))?;

        Ok(Some(description))
    }

    async fn create_index(&self, dimensions: usize) -> Result<()> {
        tracing::info!(
            "Creating Pinecone index '{}' ({} dims, {}/{})",
            self.index_name,
            dimensions,
            self.cloud,
            self.region
        );

        let request = CreateIndexRequest {
            name: self.index_name.clone(),
            dimension: dimensions,
            metric: "cosine".to_string(),
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: self.cloud.clone(),
                    region: self.region.clone(),
                },
            },
        };

        let response = self
            .http
            .post(format!("{}/indexes", self.control_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::VectorDb(format!("Pinecone create index failed: {}", e)))?;

        // 409 means another process created it first
        if !response.status().is_success() && response.status() != reqwest::StatusCode::CONFLICT {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorDb(format!(
                "Pinecone create index failed ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    /// Find the data-plane host, creating the index first when `create_with` is set
    async fn resolve_host(&self, create_with: Option<usize>) -> Result<String> {
        let description = match (self.describe_index().await?, create_with) {
            (Some(description), Some(dimensions)) if description.dimension != dimensions => {
                return Err(Error::VectorDb(format!(
                    "Pinecone index '{}' has dimension {}, embeddings have {}",
                    self.index_name, description.dimension, dimensions
                )));
            }
            (Some(description), _) => description,
            (None, Some(dimensions)) => {
                self.create_index(dimensions).await?;
                self.wait_until_ready().await?
            }
            (None, None) => {
                return Err(Error::VectorDb(format!(
                    "Pinecone index '{}' does not exist",
                    self.index_name
                )));
            }
        };

        if description.host.is_empty() {
            return Err(Error::VectorDb(format!(
                "Pinecone index '{}' has no host yet",
                self.index_name
            )));
        }

        tracing::debug!("Pinecone index '{}' at {}", self.index_name, description.host);
        Ok(description.host)
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription> {
        for _ in 0..READY_MAX_POLLS {
            if let Some(description) = self.describe_index().await? {
                if description.status.ready && !description.host.is_empty() {
                    return Ok(description);
                }
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        Err(Error::VectorDb(format!(
            "Pinecone index '{}' was not ready after {}s",
            self.index_name,
            READY_POLL_INTERVAL.as_secs() * READY_MAX_POLLS as u64
        )))
    }

    async fn host(&self) -> Result<&str> {
        self.host
            .get_or_try_init(|| self.resolve_host(None))
            .await
            .map(String::as_str)
    }

    /// Convert chunk to a Pinecone vector; `page` is omitted when unknown because
    /// Pinecone rejects null metadata values
    fn chunk_to_vector(chunk: &Chunk) -> Vector {
        let mut metadata = Map::new();
        metadata.insert("text".to_string(), Value::from(chunk.content.clone()));
        metadata.insert("source".to_string(), Value::from(chunk.source.clone()));
        metadata.insert("chunk_index".to_string(), Value::from(chunk.chunk_index));
        if let Some(page) = chunk.page {
            metadata.insert("page".to_string(), Value::from(page));
        }

        Vector {
            id: chunk.id.clone(),
            values: chunk.embedding.clone(),
            metadata,
        }
    }

    fn match_to_result(matched: QueryMatch) -> Option<VectorSearchResult> {
        let metadata = matched.metadata.unwrap_or_default();
        let Some(content) = metadata.get("text").and_then(Value::as_str) else {
            tracing::warn!("Pinecone match {} has no text metadata, skipping", matched.id);
            return None;
        };

        let chunk = Chunk {
            id: matched.id,
            source: metadata
                .get("source")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            page: metadata
                .get("page")
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok()),
            chunk_index: metadata
                .get("chunk_index")
                .and_then(Value::as_u64)
                .and_then(|i| u32::try_from(i).ok())
                .unwrap_or(0),
            content: content.to_string(),
            embedding: Vec::new(),
        };

        Some(VectorSearchResult {
            chunk,
            similarity: matched.score,
        })
    }
}

#[derive(serde::Deserialize)]
struct IndexDescription {
    #[serde(default)]
    host: String,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(serde::Deserialize, Default)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(serde::Serialize)]
struct CreateIndexRequest {
    name: String,
    dimension: usize,
    metric: String,
    spec: IndexSpec,
}

#[derive(serde::Serialize)]
struct IndexSpec {
    serverless: ServerlessSpec,
}

#[derive(serde::Serialize)]
struct ServerlessSpec {
    cloud: String,
    region: String,
}

#[derive(serde::Serialize)]
struct Vector {
    id: String,
    values: Vec<f32>,
    metadata: Map<String, Value>,
}

#[derive(serde::Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [Vector],
    namespace: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    namespace: &'a str,
}

#[derive(serde::Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(serde::Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<Map<String, Value>>,
}

#[async_trait]
impl VectorStoreProvider for PineconeStore {
    async fn ensure_index(&self, dimensions: usize) -> Result<()> {
        self.host
            .get_or_try_init(|| self.resolve_host(Some(dimensions)))
            .await?;
        Ok(())
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        if let Some(chunk) = chunks.iter().find(|c| c.embedding.is_empty()) {
            return Err(Error::VectorDb(format!(
                "Chunk {} from {} has no embedding",
                chunk.chunk_index, chunk.source
            )));
        }

        let endpoint = Self::data_url(self.host().await?, "/vectors/upsert");
        let vectors: Vec<Vector> = chunks.iter().map(Self::chunk_to_vector).collect();

        for batch in vectors.chunks(self.batch_size) {
            let request = UpsertRequest {
                vectors: batch,
                namespace: &self.namespace,
            };

            let response = self
                .http
                .post(&endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::VectorDb(format!("Pinecone upsert failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::VectorDb(format!(
                    "Pinecone upsert failed ({}): {}",
                    status, body
                )));
            }
        }

        Ok(vectors.len())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let request = QueryRequest {
            vector: query_embedding,
            top_k,
            include_metadata: true,
            namespace: &self.namespace,
        };

        let response = self
            .http
            .post(Self::data_url(self.host().await?, "/query"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::VectorDb(format!("Pinecone query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorDb(format!(
                "Pinecone query failed ({}): {}",
                status, body
            )));
        }

        let query_response: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::VectorDb(format!("Failed to parse Pinecone response: {}", e)))?;

        Ok(query_response
            .matches
            .into_iter()
            .filter_map(Self::match_to_result)
            .collect())
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
