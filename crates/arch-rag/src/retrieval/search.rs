//! Embedding store and the fixed top-2 retrieval policy

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::vector_store::VectorSearchResult;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Retrieval, RetrievedSnippet};

/// Number of matches requested per question. Not configurable: exactly two
/// references go into every prompt.
pub const RETRIEVAL_K: usize = 2;

/// Query-text search over a vector store
#[derive(Clone)]
pub struct EmbeddingStore {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStoreProvider>,
}

impl EmbeddingStore {
    /// Combine an embedding provider and a vector store
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vectors: Arc<dyn VectorStoreProvider>) -> Self {
        Self { embedder, vectors }
    }

    /// Embed `query` and return the `top_k` nearest entries, best first
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let embedding = self.embedder.embed(query).await?;
        self.vectors.search(&embedding, top_k).await
    }
}

/// Fetches the two references for a question
#[derive(Clone)]
pub struct Retriever {
    store: EmbeddingStore,
}

impl Retriever {
    /// Create a retriever over an embedding store
    pub fn new(store: EmbeddingStore) -> Self {
        Self { store }
    }

    /// Retrieve the primary and secondary references for `query`
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        let results = self.store.search(query, RETRIEVAL_K).await?;
        let retrieval = select_references(results)?;

        if retrieval.degenerate {
            tracing::warn!(
                "Index returned fewer than {} matches; reusing the only match for both references",
                RETRIEVAL_K
            );
        }

        tracing::info!(
            primary = %format!("{} p.{} ({:.3})", retrieval.primary.source, retrieval.primary.page, retrieval.primary.score),
            secondary = %format!("{} p.{} ({:.3})", retrieval.secondary.source, retrieval.secondary.page, retrieval.secondary.score),
            "Retrieved references"
        );

        Ok(retrieval)
    }
}

/// Pick the references from best-first search results
///
/// The rank-2 match becomes the primary reference and the rank-1 match the
/// secondary one. With a single match both slots hold it and the retrieval
/// is marked degenerate. No matches is [`Error::RetrievalEmpty`].
pub fn select_references(results: Vec<VectorSearchResult>) -> Result<Retrieval> {
    let mut results = results.into_iter();

    let best = results.next().ok_or(Error::RetrievalEmpty)?;
    let best = RetrievedSnippet::from(best);

    // TODO: confirm with product whether rank 2 should lead; kept as deployed.
    match results.next() {
        Some(runner_up) => Ok(Retrieval {
            primary: RetrievedSnippet::from(runner_up),
            secondary: best,
            degenerate: false,
        }),
        None => Ok(Retrieval {
            primary: best.clone(),
            secondary: best,
            degenerate: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::LocalIndex;
    use crate::testing::{fixture_index, KeywordEmbedder};
    use crate::types::IndexEntry;

    fn result(content: &str, page: u32, score: f32) -> VectorSearchResult {
        VectorSearchResult {
            entry: IndexEntry::new("ec2-ug.pdf", page, content, vec![]),
            score,
        }
    }

    #[test]
    fn test_rank_two_is_primary() {
        let retrieval = select_references(vec![
            result("best", 10, 0.92),
            result("second", 11, 0.85),
        ])
        .unwrap();

        assert_eq!(retrieval.primary.content, "second");
        assert_eq!(retrieval.primary.page, 11);
        assert_eq!(retrieval.secondary.content, "best");
        assert_eq!(retrieval.secondary.score, 0.92);
        assert!(!retrieval.degenerate);
    }

    #[test]
    fn test_extra_results_ignored() {
        let retrieval = select_references(vec![
            result("best", 1, 0.9),
            result("second", 2, 0.8),
            result("third", 3, 0.7),
        ])
        .unwrap();

        assert_eq!(retrieval.primary.content, "second");
        assert_eq!(retrieval.secondary.content, "best");
    }

    #[test]
    fn test_single_result_fills_both_slots() {
        let retrieval = select_references(vec![result("only", 4, 0.5)]).unwrap();

        assert_eq!(retrieval.primary, retrieval.secondary);
        assert_eq!(retrieval.primary.content, "only");
        assert!(retrieval.degenerate);
    }

    #[test]
    fn test_no_results_is_error() {
        let err = select_references(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::RetrievalEmpty));
    }

    #[tokio::test]
    async fn test_retriever_over_fixture_index() {
        let store = EmbeddingStore::new(
            Arc::new(KeywordEmbedder),
            Arc::new(LocalIndex::from_index(fixture_index())),
        );
        let retriever = Retriever::new(store);

        let retrieval = retriever.retrieve("How do I launch an EC2 instance?").await.unwrap();

        // The launch page is the closest match, so it lands in the secondary slot
        assert_eq!(retrieval.secondary.page, 42);
        assert_ne!(retrieval.primary.page, 42);
        assert!(retrieval.secondary.score >= retrieval.primary.score);
    }
}
