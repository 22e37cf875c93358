//! Core types for the Q&A service

pub mod index;
pub mod response;
pub mod snippet;
pub mod upload;

pub use index::{IndexEntry, PersistedIndex, INDEX_FORMAT_VERSION};
pub use response::AnswerPair;
pub use snippet::{Retrieval, RetrievedSnippet};
pub use upload::{ImageUpload, UploadRecord};
