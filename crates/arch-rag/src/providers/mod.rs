//! Provider abstractions for embeddings, chat completion, vector search and
//! image storage
//!
//! Each external service sits behind a trait so the request pipeline can be
//! exercised with in-process stand-ins.

pub mod embedding;
pub mod image_store;
pub mod inline;
pub mod llm;
pub mod local;
pub mod openai;
pub mod vector_store;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use embedding::EmbeddingProvider;
pub use image_store::ImageUploader;
pub use llm::{LlmProvider, ModelSelector};
pub use vector_store::VectorStoreProvider;
