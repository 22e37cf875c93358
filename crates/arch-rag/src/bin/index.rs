//! Index builder binary: PDFs to the JSON embedding index
//!
//! Run with: cargo run -p arch-rag --features cli --bin arch-rag-index -- ec2-ug.pdf

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arch_rag::config::RagConfig;
use arch_rag::ingestion::{IndexBuilder, TextChunker};
use arch_rag::providers::openai::OpenAiClient;

#[derive(Parser, Debug)]
#[command(name = "arch-rag-index")]
#[command(about = "Build the embedding index used by arch-rag-server", version)]
struct Args {
    /// PDF files to index
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,

    /// TOML configuration file (defaults to $ARCH_RAG_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path (defaults to index.path from the configuration)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Overlap between chunks in characters
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arch_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(size) = args.chunk_size {
        config.chunking.chunk_size = size;
    }
    if let Some(overlap) = args.chunk_overlap {
        config.chunking.chunk_overlap = overlap;
    }
    let output = args.output.unwrap_or_else(|| config.index.path.clone());

    for pdf in &args.pdfs {
        if !pdf.is_file() {
            anyhow::bail!("File does not exist: {}", pdf.display());
        }
    }

    let client = Arc::new(OpenAiClient::new(&config.llm, &config.embeddings)?);
    let builder = IndexBuilder::new(
        client,
        TextChunker::from_config(&config.chunking),
        config.embeddings.batch_size,
    );

    println!("Parsing {} PDF file(s)...", args.pdfs.len());
    let chunks = builder.collect_chunks(&args.pdfs)?;
    println!("Embedding {} chunks with {}...", chunks.len(), config.embeddings.model);

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )?
        .progress_chars("#>-"),
    );

    let index = builder
        .embed_chunks(chunks, |done| pb.set_position(done as u64))
        .await?;
    pb.finish_with_message("done");

    index.write(&output)?;

    println!("\nIndexing complete!");
    println!("  Entries:    {}", index.entries.len());
    println!("  Dimensions: {}", index.dimensions);
    println!("  Model:      {}", index.model);
    println!("  Output:     {}", output.display());

    Ok(())
}
