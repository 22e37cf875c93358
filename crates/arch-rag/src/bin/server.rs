//! Q&A server binary
//!
//! Run with: cargo run -p arch-rag --bin arch-rag-server

use arch_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arch_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      Arch RAG Q&A                         ║
║        AWS documentation answers, grounded vs. plain      ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // $ARCH_RAG_CONFIG, then .env / environment overrides
    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Index: {}", config.index.path.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Text model: {}", config.llm.text_model);
    tracing::info!("  - Vision model: {}", config.llm.vision_model);
    match &config.storage.gcs_bucket {
        Some(bucket) => tracing::info!("  - Image bucket: gs://{}", bucket),
        None => tracing::info!("  - Image bucket: none (inline data URLs)"),
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  Form: http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  GET  /          - Question form");
    println!("  POST /          - Ask (multipart: user_question, user_image)");
    println!("  POST /api/ask   - Ask, JSON answer pair");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
