//! arch-rag: AWS documentation Q&A with retrieval-augmented answers
//!
//! A question (optionally with a screenshot) is answered twice by a hosted
//! chat model: once grounded on the two closest chunks of a prebuilt
//! embedding index of the AWS user guides, and once from the bare question.
//! Both answers are converted to Traditional Chinese, rendered from markdown
//! and shown side by side.
//!
//! The `arch-rag-index` binary builds the index from PDFs; `arch-rag-server`
//! serves the form and the JSON API.

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod rendering;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::AskPipeline;
pub use types::{AnswerPair, Retrieval, RetrievedSnippet};
