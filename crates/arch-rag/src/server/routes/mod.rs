//! Routes for the Q&A server

pub mod ask;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Browser form routes mounted at `/`
pub fn page_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new().route(
        "/",
        get(ask::form).post(ask::submit_form).layer(DefaultBodyLimit::max(max_upload_size)),
    )
}

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/ask",
            post(ask::ask_json).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();

    Json(serde_json::json!({
        "name": "arch-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AWS documentation Q&A: grounded and baseline answers side by side",
        "endpoints": {
            "GET /": "Question form",
            "POST /": "Ask via form (multipart: user_question, user_image)",
            "POST /api/ask": "Ask via API (same multipart fields), JSON answer pair",
            "GET /api/info": "Service information",
            "GET /health": "Liveness check"
        },
        "index": {
            "path": config.index.path.display().to_string(),
            "entries": state.index_entries(),
            "embedding_model": config.embeddings.model,
        },
        "models": {
            "text": config.llm.text_model,
            "vision": config.llm.vision_model,
        },
        "image_uploader": state.uploader(),
        "answer_cache": config.cache.enabled,
    }))
}
