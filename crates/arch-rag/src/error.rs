//! Error types for the Q&A service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for arch-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted index missing, unreadable or inconsistent
    #[error("Failed to load index '{path}': {message}")]
    IndexLoad { path: String, message: String },

    /// The index returned no matches for the query
    #[error("No indexed content matched the question")]
    RetrievalEmpty,

    /// Embedding service error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Image upload / signing error
    #[error("Image upload failed: {0}")]
    Upload(String),

    /// Chat-completion error
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Malformed inbound request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Source document could not be parsed while building an index
    #[error("Failed to parse '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an index load error
    pub fn index_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an upload error
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload(message.into())
    }

    /// Create an inference error
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::IndexLoad { .. } => "index_error",
            Error::RetrievalEmpty => "retrieval_empty",
            Error::Embedding(_) => "embedding_error",
            Error::Upload(_) => "upload_error",
            Error::Inference(_) => "inference_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::FileParse { .. } => "parse_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidRequest(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::RetrievalEmpty => StatusCode::NOT_FOUND,
            Error::Upload(_) | Error::Inference(_) => StatusCode::BAD_GATEWAY,
            Error::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_)
            | Error::IndexLoad { .. }
            | Error::FileParse { .. }
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::warn!(kind = self.kind(), "{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
