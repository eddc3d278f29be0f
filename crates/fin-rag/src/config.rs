//! Configuration for the document QA service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the Gemini API key
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable holding the Pinecone API key
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";
/// Environment variable pointing at an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "FIN_RAG_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Local document directory and downloads
    pub documents: DocumentsConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Gemini embedding and generation
    pub gemini: GeminiConfig,
    /// Pinecone vector index
    pub pinecone: PineconeConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides.
    ///
    /// When `path` is `None` the `FIN_RAG_CONFIG` variable is consulted; when neither
    /// is set the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read config {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(key) = get(GOOGLE_API_KEY_ENV) {
            self.gemini.api_key = Some(key);
        }
        if let Some(key) = get(PINECONE_API_KEY_ENV) {
            self.pinecone.api_key = Some(key);
        }
        if let Some(host) = get("FIN_RAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("FIN_RAG_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid FIN_RAG_PORT value: {}", port),
            }
        }
        if let Some(dir) = get("FIN_RAG_DOCUMENTS_DIR") {
            self.documents.dir = PathBuf::from(dir);
        }
    }

    /// Gemini API key, required at startup
    pub fn google_api_key(&self) -> Result<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", GOOGLE_API_KEY_ENV)))
    }

    /// Pinecone API key, required at startup
    pub fn pinecone_api_key(&self) -> Result<&str> {
        self.pinecone
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", PINECONE_API_KEY_ENV)))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Build the index from existing documents before serving
    pub index_on_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            index_on_startup: false,
        }
    }
}

/// Local document storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding fetched and uploaded documents
    pub dir: PathBuf,
    /// Timeout for remote document downloads in seconds
    pub download_timeout_secs: u64,
    /// Filename used when a URL has no usable last path segment
    pub default_filename: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("documents"),
            download_timeout_secs: 20,
            default_filename: "downloaded_file.pdf".to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks fed to the model
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 2 }
    }
}

/// Gemini (Generative Language API) configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key, normally taken from `GOOGLE_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Embedding dimensions (768 for embedding-001)
    pub dimensions: usize,
    /// Generation model name
    pub generate_model: String,
    /// Sampling temperature; the model default is used when unset
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("embed_model", &self.embed_model)
            .field("dimensions", &self.dimensions)
            .field("generate_model", &self.generate_model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embed_model: "models/embedding-001".to_string(),
            dimensions: 768,
            generate_model: "models/gemini-2.0-flash".to_string(),
            temperature: None,
            timeout_secs: 120,
        }
    }
}

/// Pinecone configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// API key, normally taken from `PINECONE_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Index name
    pub index_name: String,
    /// Control plane URL
    pub control_url: String,
    /// Value of the `X-Pinecone-API-Version` header
    pub api_version: String,
    /// Cloud used when the index has to be created
    pub cloud: String,
    /// Region used when the index has to be created
    pub region: String,
    /// Namespace for all vectors (empty = default namespace)
    pub namespace: String,
    /// Vectors per upsert request
    pub upsert_batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("index_name", &self.index_name)
            .field("control_url", &self.control_url)
            .field("api_version", &self.api_version)
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .field("namespace", &self.namespace)
            .field("upsert_batch_size", &self.upsert_batch_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "langchain".to_string(),
            control_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            namespace: String::new(),
            upsert_batch_size: 100,
            timeout_secs: 60,
        }
    }
}
