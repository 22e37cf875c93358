//! Image "upload" as a base64 data URL
//!
//! Used when no bucket is configured. The chat API accepts `data:` URLs for
//! image parts, so no external storage is involved and the URL never expires.

use async_trait::async_trait;
use base64::Engine;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::UploadRecord;

use super::image_store::ImageUploader;

/// Encodes the saved image into a `data:` URL
#[derive(Debug, Default, Clone)]
pub struct InlineImageUploader;

impl InlineImageUploader {
    /// Create a new inline uploader
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageUploader for InlineImageUploader {
    async fn upload(
        &self,
        file_path: &Path,
        object_name: &str,
        content_type: &str,
    ) -> Result<UploadRecord> {
        let data = tokio::fs::read(file_path).await.map_err(|e| {
            Error::upload(format!("Failed to read {}: {}", file_path.display(), e))
        })?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&data);

        tracing::debug!("Inlined image {} ({} bytes)", object_name, data.len());

        Ok(UploadRecord {
            local_path: file_path.to_path_buf(),
            url: format!("data:{};base64,{}", content_type, encoded),
            expires_at: None,
        })
    }

    fn name(&self) -> &str {
        "inline"
    }
}
