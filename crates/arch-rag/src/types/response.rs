//! Response types for answered questions

use serde::{Deserialize, Serialize};

use super::snippet::Retrieval;

/// Retrieval-augmented answer and baseline answer, rendered to HTML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPair {
    /// Answer grounded on the retrieved references
    pub rag_html: String,
    /// Answer to the bare question
    pub plain_html: String,
    /// References used for the grounded answer
    pub retrieval: Retrieval,
    /// Image URL sent with both calls, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Degraded-path messages shown to the user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    /// Wall-clock time spent answering
    pub processing_time_ms: u64,
}
