//! Image uploader trait for handing user images to the chat API

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::UploadRecord;

/// Trait for publishing a locally saved image under a URL the chat API can read
///
/// Implementations:
/// - `GcsImageUploader`: Google Cloud Storage with a V4 signed URL
/// - `InlineImageUploader`: base64 `data:` URL, no external storage
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Publish the file at `file_path` as `object_name`
    async fn upload(
        &self,
        file_path: &Path,
        object_name: &str,
        content_type: &str,
    ) -> Result<UploadRecord>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Content type for an uploaded image, guessed from the client file name
/// and defaulting to PNG
pub fn image_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "image/png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(image_content_type("diagram.jpg"), "image/jpeg");
        assert_eq!(image_content_type("shot.png"), "image/png");
        assert_eq!(image_content_type("photo.webp"), "image/webp");
        assert_eq!(image_content_type("no-extension"), "image/png");
        assert_eq!(image_content_type("notes.txt"), "image/png");
    }
}
