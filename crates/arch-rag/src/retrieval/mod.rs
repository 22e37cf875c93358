//! Retrieval of reference snippets from the embedding index

pub mod search;

pub use search::{select_references, EmbeddingStore, Retriever, RETRIEVAL_K};
