//! User image uploads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image received with a question, before it is stored
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name
    pub filename: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Name used both on disk and in the bucket: original name plus a UUID
    pub fn storage_name(&self) -> String {
        let base = std::path::Path::new(&self.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("image");
        format!("{}{}", base, uuid::Uuid::new_v4())
    }
}

/// A stored image and the URL the chat API can read it from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Local copy of the upload
    pub local_path: PathBuf,
    /// URL handed to the chat API (signed URL or data URL)
    pub url: String,
    /// When the URL stops working; `None` for URLs that do not expire
    pub expires_at: Option<DateTime<Utc>>,
}
