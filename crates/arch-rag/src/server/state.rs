//! Application state for the Q&A server

use std::sync::Arc;

use crate::cache::CachingLlm;
use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AskPipeline;
use crate::providers::inline::InlineImageUploader;
use crate::providers::local::LocalIndex;
use crate::providers::openai::OpenAiClient;
use crate::providers::{EmbeddingProvider, ImageUploader, LlmProvider, VectorStoreProvider};
use crate::retrieval::{EmbeddingStore, Retriever};

#[cfg(feature = "gcp")]
use crate::providers::gcp::GcsImageUploader;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Question pipeline
    pipeline: AskPipeline,
    /// Number of indexed chunks
    index_entries: usize,
    /// Name of the active image uploader
    uploader: String,
}

impl AppState {
    /// Build every handle from configuration: OpenAI client, index and uploader
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let openai = Arc::new(OpenAiClient::new(&config.llm, &config.embeddings)?);

        let index = LocalIndex::load(&config.index.path)?;
        if index.model() != config.embeddings.model {
            tracing::warn!(
                "Index was built with {} but queries use {}; scores may be meaningless",
                index.model(),
                config.embeddings.model
            );
        }
        let index_entries = index.len().await?;

        let embedder: Arc<dyn EmbeddingProvider> = openai.clone();
        let vectors: Arc<dyn VectorStoreProvider> = Arc::new(index);
        let retriever = Retriever::new(EmbeddingStore::new(embedder, vectors));

        let llm: Arc<dyn LlmProvider> = if config.cache.enabled {
            tracing::info!(
                "Answer cache enabled ({} entries, {}s TTL)",
                config.cache.max_entries,
                config.cache.ttl_secs
            );
            Arc::new(CachingLlm::new(openai, &config.cache))
        } else {
            openai
        };

        let uploader = Self::build_uploader(&config).await?;
        let uploader_name = uploader.name().to_string();

        let pipeline = AskPipeline::new(retriever, llm, Some(uploader), config.uploads.upload_dir());

        tracing::info!(
            "Application state ready ({} indexed chunks, uploader: {})",
            index_entries,
            uploader_name
        );

        Ok(Self::from_parts(config, pipeline, index_entries, uploader_name))
    }

    /// Assemble state from an already built pipeline
    pub fn from_parts(
        config: RagConfig,
        pipeline: AskPipeline,
        index_entries: usize,
        uploader: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                index_entries,
                uploader: uploader.into(),
            }),
        }
    }

    #[cfg(feature = "gcp")]
    async fn build_uploader(config: &RagConfig) -> Result<Arc<dyn ImageUploader>> {
        if config.storage.gcs_bucket.is_some() {
            return Ok(Arc::new(GcsImageUploader::new(&config.storage).await?));
        }
        tracing::info!("No GCS bucket configured; images are sent inline");
        Ok(Arc::new(InlineImageUploader::new()))
    }

    #[cfg(not(feature = "gcp"))]
    async fn build_uploader(config: &RagConfig) -> Result<Arc<dyn ImageUploader>> {
        if let Some(bucket) = &config.storage.gcs_bucket {
            tracing::warn!(
                "storage.gcs_bucket = {} ignored: built without the gcp feature",
                bucket
            );
        }
        Ok(Arc::new(InlineImageUploader::new()))
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the question pipeline
    pub fn pipeline(&self) -> &AskPipeline {
        &self.inner.pipeline
    }

    /// Number of indexed chunks
    pub fn index_entries(&self) -> usize {
        self.inner.index_entries
    }

    /// Active image uploader name
    pub fn uploader(&self) -> &str {
        &self.inner.uploader
    }
}
