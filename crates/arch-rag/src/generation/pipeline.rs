//! Question answering: retrieval, the two chat calls and rendering
//!
//! Every question is answered twice with the same image reference: once with
//! the retrieved references in the prompt and once with the bare question,
//! so the page can show the grounded answer next to a baseline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::image_store::image_content_type;
use crate::providers::{ImageUploader, LlmProvider};
use crate::rendering::{MarkdownRenderer, ScriptNormalizer};
use crate::retrieval::Retriever;
use crate::types::{AnswerPair, ImageUpload, UploadRecord};

use super::prompt::PromptBuilder;

/// Orchestrates one question from upload to rendered HTML
#[derive(Clone)]
pub struct AskPipeline {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    uploader: Option<Arc<dyn ImageUploader>>,
    renderer: MarkdownRenderer,
    normalizer: ScriptNormalizer,
    upload_dir: PathBuf,
}

impl AskPipeline {
    /// Create a pipeline; without an uploader, images are ignored with a notice
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmProvider>,
        uploader: Option<Arc<dyn ImageUploader>>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            retriever,
            llm,
            uploader,
            renderer: MarkdownRenderer::new(),
            normalizer: ScriptNormalizer::new(),
            upload_dir: upload_dir.into(),
        }
    }

    /// Answer `question`, optionally about `image`
    ///
    /// A failed image upload does not fail the request: the answer is
    /// produced text-only and the failure is reported in `notices`.
    pub async fn answer(&self, question: &str, image: Option<ImageUpload>) -> Result<AnswerPair> {
        let start = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("Question must not be empty".to_string()));
        }

        tracing::info!("Question: \"{}\" (image: {})", question, image.is_some());

        let mut notices = Vec::new();
        let image_url = match image {
            Some(image) => match self.publish_image(&image).await {
                Ok(record) => Some(record.url),
                Err(e) => {
                    tracing::warn!("Image upload failed, answering text-only: {}", e);
                    notices.push(format!("圖片上傳失敗，改以純文字回答（{}）", e));
                    None
                }
            },
            None => None,
        };

        let retrieval = self.retriever.retrieve(question).await?;
        let prompt =
            PromptBuilder::build_rag_prompt(&retrieval.primary, &retrieval.secondary, question);

        let url = image_url.as_deref();
        let (rag_raw, plain_raw) = tokio::try_join!(
            self.llm.complete(&prompt, url),
            self.llm.complete(question, url)
        )?;

        let rag_html = self.to_html(&rag_raw);
        let plain_html = self.to_html(&plain_raw);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            model = %self.llm.model_for(url),
            rag_len = rag_html.len(),
            plain_len = plain_html.len(),
            processing_time_ms,
            "Answered question"
        );

        Ok(AnswerPair {
            rag_html,
            plain_html,
            retrieval,
            image_url,
            notices,
            processing_time_ms,
        })
    }

    /// Normalize script, then render markdown
    pub fn to_html(&self, raw: &str) -> String {
        self.renderer.render(&self.normalizer.normalize(raw))
    }

    /// Save the image under the upload directory and publish it
    async fn publish_image(&self, image: &ImageUpload) -> Result<UploadRecord> {
        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| Error::upload("no image uploader is configured"))?;

        let name = image.storage_name();
        let path = self.upload_dir.join(&name);

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(&path, &image.data).await?;
        tracing::debug!("Saved upload {} ({} bytes)", path.display(), image.data.len());

        let content_type = image_content_type(&image.filename);
        let record = uploader.upload(&path, &name, &content_type).await?;

        tracing::info!("Uploaded image via {} as {}", uploader.name(), name);
        Ok(record)
    }
}
