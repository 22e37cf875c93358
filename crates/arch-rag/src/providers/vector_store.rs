//! Vector store provider trait for similarity search

use async_trait::async_trait;
use crate::error::Result;
use crate::types::IndexEntry;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched entry
    pub entry: IndexEntry,
    /// Similarity score (higher is more similar)
    pub score: f32,
}

/// Trait for read-only similarity search over an embedding index
///
/// Implementations:
/// - `LocalIndex`: persisted JSON index held in memory
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Search for the `top_k` most similar entries, best first
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
