//! Configuration for the Q&A service
//!
//! Configuration is read from an optional TOML file and then overlaid with
//! environment variables (including a `.env` file). The process environment
//! is only read, never written; the resulting [`RagConfig`] is passed
//! explicitly to every component.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "ARCH_RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Persisted embedding index
    pub index: IndexConfig,
    /// Embedding service configuration
    pub embeddings: EmbeddingConfig,
    /// Chat-completion configuration
    pub llm: LlmConfig,
    /// Object storage for user images
    pub storage: StorageConfig,
    /// Local upload handling
    pub uploads: UploadsConfig,
    /// Answer memoization
    pub cache: CacheConfig,
    /// Chunking used by the index builder
    pub chunking: ChunkingConfig,
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
    /// Maximum upload size in bytes (default: 20MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 20 * 1024 * 1024, // 20MB
        }
    }
}

/// Persisted index location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Path of the JSON index written by `arch-rag-index`
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("embedding").join("index.json"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (1536 for ada-002)
    pub dimensions: usize,
    /// Texts per embeddings request when building an index
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            batch_size: 32,
        }
    }
}

/// Chat-completion (OpenAI-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// API key; normally supplied through the environment
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model used when the request carries no image
    pub text_model: String,
    /// Model used when an image is attached
    pub vision_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests (0 = fail on first error)
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            text_model: "gpt-3.5-turbo".to_string(),
            vision_model: "gpt-4o".to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// API key, or a configuration error when none was supplied
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("OpenAI API key missing (set OPENAI_API_KEY)".to_string())
            })
    }
}

/// Object storage for user-submitted images
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// GCS bucket; when unset images are sent inline as data URLs
    pub gcs_bucket: Option<String>,
    /// Path to service account JSON key file
    pub service_account_key_path: PathBuf,
    /// Object name prefix inside the bucket
    pub object_prefix: String,
    /// Lifetime of signed URLs in seconds
    pub signed_url_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            gcs_bucket: None,
            service_account_key_path: PathBuf::from("config").join("gcs.json"),
            object_prefix: String::new(),
            signed_url_ttl_secs: 3600, // 1 hour
        }
    }
}

/// Local upload handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Media root; images are written to `{media_root}/uploads`
    pub media_root: PathBuf,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
        }
    }
}

impl UploadsConfig {
    /// Directory that receives uploaded images
    pub fn upload_dir(&self) -> PathBuf {
        self.media_root.join("uploads")
    }
}

/// Answer memoization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable memoization of chat completions
    pub enabled: bool,
    /// Maximum cached completions
    pub max_entries: usize,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: 256,
            ttl_secs: 3600,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 50,
        }
    }
}

impl RagConfig {
    /// Load configuration from an optional TOML file plus the environment
    ///
    /// The file path is `path` if given, otherwise `$ARCH_RAG_CONFIG` if set.
    /// Without either, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = read_environment();

        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env.get(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match file {
            Some(file) => Self::from_toml_file(&file)?,
            None => Self::default(),
        };

        config.apply_env(|key| env.get(key).cloned());
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // `openai` is the key name used by older deployments' .env files
        if let Some(key) = lookup("OPENAI_API_KEY").or_else(|| lookup("openai")) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("ARCH_RAG_TEXT_MODEL") {
            self.llm.text_model = model;
        }
        if let Some(model) = lookup("ARCH_RAG_VISION_MODEL") {
            self.llm.vision_model = model;
        }
        if let Some(path) = lookup("ARCH_RAG_INDEX_PATH") {
            self.index.path = PathBuf::from(path);
        }
        if let Some(bucket) = lookup("ARCH_RAG_GCS_BUCKET") {
            self.storage.gcs_bucket = Some(bucket).filter(|b| !b.is_empty());
        }
        if let Some(path) = lookup("GOOGLE_APPLICATION_CREDENTIALS") {
            self.storage.service_account_key_path = PathBuf::from(path);
        }
        if let Some(root) = lookup("ARCH_RAG_MEDIA_ROOT") {
            self.uploads.media_root = PathBuf::from(root);
        }
        if let Some(host) = lookup("ARCH_RAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ARCH_RAG_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid ARCH_RAG_PORT={}", port),
            }
        }
    }
}

/// Snapshot of `.env` entries overlaid with the real process environment
fn read_environment() -> HashMap<String, String> {
    let mut vars = HashMap::new();

    if let Ok(iter) = dotenvy::dotenv_iter() {
        for item in iter {
            match item {
                Ok((key, value)) => {
                    vars.insert(key, value);
                }
                Err(e) => tracing::warn!("Skipping malformed .env line: {}", e),
            }
        }
    }

    vars.extend(std::env::vars());
    vars
}
