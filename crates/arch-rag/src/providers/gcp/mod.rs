//! Google Cloud Platform provider implementations
//!
//! - Google Cloud Storage for user images, shared through V4 signed URLs

mod gcs_store;

pub use gcs_store::GcsImageUploader;
