//! OpenAI client for chat completions and embeddings
//!
//! Endpoints are derived from `LlmConfig::base_url`:
//! - POST {base_url}/v1/chat/completions
//! - POST {base_url}/v1/embeddings
//!
//! One client is shared by the embedding and chat paths so both use the
//! same connection pool, timeout and retry policy.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{LlmProvider, ModelSelector};

/// OpenAI API client with automatic retry
pub struct OpenAiClient {
    /// HTTP client (auth header preinstalled)
    client: Client,
    /// Chat model selection
    models: ModelSelector,
    /// Embedding model
    embed_model: String,
    /// Embedding dimensions
    dimensions: usize,
    /// Maximum retries
    max_retries: u32,
    url_chat: String,
    url_embeddings: String,
}

/// A failed attempt and whether trying again could help
struct AttemptError {
    error: Error,
    retryable: bool,
}

impl AttemptError {
    fn transient(error: Error) -> Self {
        Self {
            error,
            retryable: true,
        }
    }
}

/// Client errors other than 429 fail the same way on every attempt
fn is_retryable(status: StatusCode) -> bool {
    !status.is_client_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

impl<'a> ChatRequest<'a> {
    /// Single user message; an image turns the content into text + image parts
    fn single_turn(model: &'a str, prompt: &'a str, image_url: Option<&'a str>) -> Self {
        let content = match image_url {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                },
            ]),
            None => MessageContent::Text(prompt),
        };

        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        }
    }
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// Fails when no API key is configured or the base URL is not http(s).
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        let api_key = llm.require_api_key()?;

        let base = llm.base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Invalid OpenAI base URL: {}",
                llm.base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::Config(format!("Invalid API key header: {}", e)))?;
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            base_url = %base,
            text_model = %llm.text_model,
            vision_model = %llm.vision_model,
            embed_model = %embeddings.model,
            timeout_secs = llm.timeout_secs,
            "OpenAI client initialized"
        );

        Ok(Self {
            client,
            models: ModelSelector::from_config(llm),
            embed_model: embeddings.model.clone(),
            dimensions: embeddings.dimensions,
            max_retries: llm.max_retries,
            url_chat: format!("{}/v1/chat/completions", base),
            url_embeddings: format!("{}/v1/embeddings", base),
        })
    }

    /// Retry a request with exponential backoff; non-retryable failures
    /// return immediately
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(AttemptError { error, retryable }) => {
                    if !retryable || attempt >= self.max_retries {
                        return Err(error);
                    }

                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        error,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// POST a JSON body and decode the JSON reply, mapping failures with `wrap`
    async fn post_json<B, T>(
        &self,
        url: &str,
        body: &B,
        wrap: fn(String) -> Error,
    ) -> std::result::Result<T, AttemptError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::transient(wrap(format!("request to {} failed: {}", url, e))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError {
                error: wrap(format!("HTTP {} - {}", status, snippet(&body, 300))),
                retryable: is_retryable(status),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AttemptError::transient(wrap(format!("failed to parse response: {}", e))))
    }
}

/// First `max` characters of a response body for error messages
fn snippet(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn complete(&self, prompt: &str, image_url: Option<&str>) -> Result<String> {
        let started = Instant::now();
        let model = self.models.select(image_url);
        let request = ChatRequest::single_turn(model, prompt, image_url);

        tracing::debug!(
            model = %model,
            prompt_len = prompt.len(),
            has_image = image_url.is_some(),
            "POST {}", self.url_chat
        );

        let response: ChatResponse = self
            .retry_request(|| self.post_json(&self.url_chat, &request, Error::Inference))
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::inference("No message content in chat completion"))?;

        tracing::info!(
            model = %model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            answer_len = content.len(),
            "Chat completion finished"
        );

        Ok(content)
    }

    fn model_for(&self, image_url: Option<&str>) -> &str {
        self.models.select(image_url)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("Empty embeddings response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.embed_model,
            input: texts,
        };

        tracing::debug!(model = %self.embed_model, inputs = texts.len(), "POST {}", self.url_embeddings);

        let response: EmbedResponse = self
            .retry_request(|| self.post_json(&self.url_embeddings, &request, Error::Embedding))
            .await?;

        if response.data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.embed_model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::HeaderMap,
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_text_only_request_shape() {
        let request = ChatRequest::single_turn("gpt-3.5-turbo", "How do I launch an instance?", None);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{ "role": "user", "content": "How do I launch an instance?" }]
            })
        );
    }

    #[test]
    fn test_image_request_shape() {
        let request = ChatRequest::single_turn("gpt-4o", "What is wrong here?", Some("https://x/y.png"));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value["messages"][0]["content"],
            json!([
                { "type": "text", "text": "What is wrong here?" },
                { "type": "image_url", "image_url": { "url": "https://x/y.png" } }
            ])
        );
    }

    #[test]
    fn test_requires_api_key() {
        let result = OpenAiClient::new(&LlmConfig::default(), &EmbeddingConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let llm = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "api.openai.com".to_string(),
            ..Default::default()
        };
        let result = OpenAiClient::new(&llm, &EmbeddingConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("短回應", 10), "短回應");
        assert_eq!(snippet("雲端架構師", 2), "雲端...");
    }

    #[test]
    fn test_chat_response_without_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    /// Serve `router` on an ephemeral local port and return its base URL
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String, max_retries: u32) -> OpenAiClient {
        let llm = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url,
            max_retries,
            ..Default::default()
        };
        let embeddings = EmbeddingConfig {
            dimensions: 2,
            ..Default::default()
        };
        OpenAiClient::new(&llm, &embeddings).unwrap()
    }

    #[tokio::test]
    async fn test_complete_round_trip() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
                    != Some("Bearer sk-test")
                {
                    return (StatusCode::UNAUTHORIZED, "missing key").into_response();
                }
                let model = body["model"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "choices": [{
                        "message": { "role": "assistant", "content": format!("answer from {}", model) }
                    }]
                }))
                .into_response()
            }),
        );
        let client = client_for(serve(router).await, 0);

        let text = client.complete("How do I resize an EBS volume?", None).await.unwrap();
        assert_eq!(text, "answer from gpt-3.5-turbo");

        let vision = client
            .complete("What is wrong here?", Some("https://x/y.png"))
            .await
            .unwrap();
        assert_eq!(vision, "answer from gpt-4o");
    }

    #[tokio::test]
    async fn test_embed_batch_restores_input_order() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|| async {
                Json(json!({
                    "data": [
                        { "index": 1, "embedding": [0.0, 1.0] },
                        { "index": 0, "embedding": [1.0, 0.0] }
                    ]
                }))
            }),
        );
        let client = client_for(serve(router).await, 0);

        let vectors = client
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::UNAUTHORIZED, "invalid api key")
                }),
            )
            .with_state(hits.clone());
        let client = client_for(serve(router).await, 2);

        let started = Instant::now();
        let err = client.complete("question", None).await.unwrap_err();

        assert_eq!(err.kind(), "inference_error");
        assert!(err.to_string().contains("401"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
                    }
                    Json(json!({ "choices": [{ "message": { "content": "ok" } }] })).into_response()
                }),
            )
            .with_state(hits.clone());
        let client = client_for(serve(router).await, 1);

        assert_eq!(client.complete("question", None).await.unwrap(), "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
