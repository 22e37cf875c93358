//! Google Cloud Storage image uploader
//!
//! Uploads the saved image to a bucket and returns a signed GET URL so the
//! chat API can fetch the private object for a limited time.

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::time::Duration;

use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use google_cloud_storage::sign::{SignedURLMethod, SignedURLOptions};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::providers::image_store::ImageUploader;
use crate::types::UploadRecord;

/// Google Cloud Storage image uploader
pub struct GcsImageUploader {
    client: GcsClient,
    bucket: String,
    prefix: String,
    url_ttl: Duration,
}

impl GcsImageUploader {
    /// Create an uploader authenticated with the configured service account key
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .gcs_bucket
            .clone()
            .ok_or_else(|| Error::Config("GCS uploader requires storage.gcs_bucket".to_string()))?;

        let key_path = &config.service_account_key_path;
        if !key_path.exists() {
            return Err(Error::Config(format!(
                "Service account key not found: {}",
                key_path.display()
            )));
        }

        let credentials = CredentialsFile::new_from_file(key_path.to_string_lossy().to_string())
            .await
            .map_err(|e| Error::Config(format!("Invalid service account key: {}", e)))?;

        let client_config = ClientConfig::default()
            .with_credentials(credentials)
            .await
            .map_err(|e| Error::Config(format!("Failed to create GCS client: {}", e)))?;

        tracing::info!(
            "GCS uploader ready (bucket: {}, url ttl: {}s)",
            bucket,
            config.signed_url_ttl_secs
        );

        Ok(Self {
            client: GcsClient::new(client_config),
            bucket,
            prefix: config.object_prefix.clone(),
            url_ttl: Duration::from_secs(config.signed_url_ttl_secs),
        })
    }

    /// Full object path inside the bucket
    fn object_path(&self, object_name: &str) -> String {
        format!("{}{}", self.prefix, object_name)
    }
}

#[async_trait]
impl ImageUploader for GcsImageUploader {
    async fn upload(
        &self,
        file_path: &Path,
        object_name: &str,
        content_type: &str,
    ) -> Result<UploadRecord> {
        let data = tokio::fs::read(file_path).await.map_err(|e| {
            Error::upload(format!("Failed to read {}: {}", file_path.display(), e))
        })?;

        let object_path = self.object_path(object_name);

        let mut media = Media::new(object_path.clone());
        media.content_type = content_type.to_string().into();
        let upload_type = UploadType::Simple(media);

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    ..Default::default()
                },
                data,
                &upload_type,
            )
            .await
            .map_err(|e| Error::upload(format!("Failed to upload to GCS: {}", e)))?;

        let issued_at = Utc::now();
        let url = self
            .client
            .signed_url(
                &self.bucket,
                &object_path,
                None,
                None,
                SignedURLOptions {
                    method: SignedURLMethod::GET,
                    expires: self.url_ttl,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Error::upload(format!("Failed to sign GCS URL: {}", e)))?;

        let expires_at = chrono::Duration::from_std(self.url_ttl)
            .ok()
            .map(|ttl| issued_at + ttl);

        tracing::info!("Uploaded gs://{}/{}", self.bucket, object_path);

        Ok(UploadRecord {
            local_path: file_path.to_path_buf(),
            url,
            expires_at,
        })
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
