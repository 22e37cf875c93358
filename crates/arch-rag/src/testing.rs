//! In-process stand-ins for the external services, used by unit tests

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, ImageUploader, LlmProvider, ModelSelector};
use crate::types::{IndexEntry, PersistedIndex, UploadRecord};

const VOCABULARY: &[&str] = &[
    "launch", "instance", "ec2", "ami", "key", "pair", "ebs", "volume", "security", "group",
];

/// Signed URL returned by [`StubUploader`]
pub const STUB_SIGNED_URL: &str =
    "https://storage.googleapis.com/awsrag/stub.png?X-Goog-Expires=3600&X-Goog-Signature=stub";

/// Deterministic embedder: one dimension per vocabulary word, valued by
/// occurrence count
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vectorize(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vectorize(text))
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }

    fn model(&self) -> &str {
        "keyword-test"
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Small user-guide index; the launch walkthrough is on pages 42 and 43
pub fn fixture_index() -> PersistedIndex {
    let pages = [
        (
            42,
            "Step 1: Open the Amazon EC2 console and choose Launch instance. \
             Step 2: Select an AMI for the instance. (User Guide, page 42)",
        ),
        (
            43,
            "Step 3: Choose an instance type and a key pair, then choose Launch instance. \
             (User Guide, page 43)",
        ),
        (
            120,
            "Create an EBS volume and attach it to a running instance. (User Guide, page 120)",
        ),
        (200, "Security group rules control inbound traffic. (User Guide, page 200)"),
    ];

    let mut index = PersistedIndex::new("keyword-test", VOCABULARY.len());
    index.entries = pages
        .iter()
        .map(|(page, text)| {
            IndexEntry::new("ec2-ug.pdf", *page, *text, KeywordEmbedder::vectorize(text))
        })
        .collect();
    index
}

/// One recorded chat completion
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub prompt: String,
    pub image_url: Option<String>,
    pub model: String,
}

/// Chat stand-in that records every call and answers with the prompt
pub struct RecordingLlm {
    models: ModelSelector,
    calls: Mutex<Vec<LlmCall>>,
}

impl RecordingLlm {
    pub fn new() -> Self {
        Self {
            models: ModelSelector::new("gpt-3.5-turbo", "gpt-4o"),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    async fn complete(&self, prompt: &str, image_url: Option<&str>) -> Result<String> {
        let model = self.models.select(image_url).to_string();
        self.calls.lock().push(LlmCall {
            prompt: prompt.to_string(),
            image_url: image_url.map(str::to_string),
            model: model.clone(),
        });
        Ok(format!("## 回答 ({})\n\n{}", model, prompt.trim()))
    }

    fn model_for(&self, image_url: Option<&str>) -> &str {
        self.models.select(image_url)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Chat stand-in that always fails
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn complete(&self, _prompt: &str, _image_url: Option<&str>) -> Result<String> {
        Err(Error::inference("HTTP 401 Unauthorized - invalid api key"))
    }

    fn model_for(&self, _image_url: Option<&str>) -> &str {
        "gpt-3.5-turbo"
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Uploader returning a fixed signed URL
pub struct StubUploader {
    uploads: Mutex<Vec<String>>,
}

impl StubUploader {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ImageUploader for StubUploader {
    async fn upload(
        &self,
        file_path: &Path,
        object_name: &str,
        _content_type: &str,
    ) -> Result<UploadRecord> {
        self.uploads.lock().push(object_name.to_string());
        Ok(UploadRecord {
            local_path: file_path.to_path_buf(),
            url: STUB_SIGNED_URL.to_string(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Uploader that always fails
pub struct FailingUploader;

#[async_trait]
impl ImageUploader for FailingUploader {
    async fn upload(
        &self,
        _file_path: &Path,
        _object_name: &str,
        _content_type: &str,
    ) -> Result<UploadRecord> {
        Err(Error::upload("403 Forbidden: bucket awsrag"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
