//! In-memory vector store over the persisted JSON index
//!
//! The index is loaded once at startup and shared read-only; search is an
//! exact cosine-similarity scan.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{IndexEntry, PersistedIndex};

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Local vector store holding every entry of a persisted index
pub struct LocalIndex {
    model: String,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl LocalIndex {
    /// Load and validate an index file
    pub fn load(path: &Path) -> Result<Self> {
        let index = PersistedIndex::read(path)?;

        tracing::info!(
            "Loaded index {} ({} entries, model {}, {} dims)",
            path.display(),
            index.entries.len(),
            index.model,
            index.dimensions
        );

        Ok(Self::from_index(index))
    }

    /// Wrap an already validated index
    pub fn from_index(index: PersistedIndex) -> Self {
        Self {
            model: index.model,
            dimensions: index.dimensions,
            entries: index.entries,
        }
    }

    /// Embedding model the index was built with
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search_sync(&self, query: &[f32], top_k: usize) -> Vec<VectorSearchResult> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(score, entry)| VectorSearchResult {
                entry: entry.clone(),
                score,
            })
            .collect()
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm or lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorStoreProvider for LocalIndex {
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        if query_embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query has {} dims, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }
        Ok(self.search_sync(query_embedding, top_k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LocalIndex {
        let mut index = PersistedIndex::new("test", 2);
        index.entries = vec![
            IndexEntry::new("a.pdf", 1, "east", vec![1.0, 0.0]),
            IndexEntry::new("a.pdf", 2, "north-east", vec![0.7, 0.7]),
            IndexEntry::new("a.pdf", 3, "north", vec![0.0, 1.0]),
        ];
        LocalIndex::from_index(index)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_orders_best_first() {
        let index = index();
        let results = index.search(&[1.0, 0.1], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.content, "east");
        assert_eq!(results[1].entry.content, "north-east");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_fewer_than_k() {
        let mut single = PersistedIndex::new("test", 2);
        single.entries = vec![IndexEntry::new("a.pdf", 1, "only", vec![1.0, 0.0])];
        let index = LocalIndex::from_index(single);

        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(index.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_rejects_dimension_mismatch() {
        let mut wide = PersistedIndex::new("test", 3);
        wide.entries = vec![
            IndexEntry::new("a.pdf", 1, "x", vec![1.0, 0.0, 0.0]),
            IndexEntry::new("a.pdf", 2, "y", vec![0.0, 1.0, 0.0]),
        ];
        let index = LocalIndex::from_index(wide);

        let err = index.search(&[1.0, 0.0], 2).await.unwrap_err();
        assert_eq!(err.kind(), "embedding_error");
        assert!(err.to_string().contains("query has 2 dims, index has 3"));
    }
}
