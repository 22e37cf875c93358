//! Retrieved reference snippets

use serde::{Deserialize, Serialize};

use crate::providers::vector_store::VectorSearchResult;

/// One scored match from the embedding index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    /// Similarity score (higher is more similar)
    pub score: f32,
    /// Source document identifier (file name)
    pub source: String,
    /// 1-based page number within the source
    pub page: u32,
    /// Chunk text
    pub content: String,
}

impl From<VectorSearchResult> for RetrievedSnippet {
    fn from(result: VectorSearchResult) -> Self {
        Self {
            score: result.score,
            source: result.entry.source,
            page: result.entry.page,
            content: result.entry.content,
        }
    }
}

/// The two references used to ground an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    /// Presented first in the prompt (rank-2 match when available)
    pub primary: RetrievedSnippet,
    /// Presented second in the prompt (rank-1 match)
    pub secondary: RetrievedSnippet,
    /// True when the index returned fewer matches than requested and
    /// both slots hold the same snippet
    pub degenerate: bool,
}
