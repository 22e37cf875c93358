//! Offline index construction: PDFs to a persisted embedding index

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{IndexEntry, PersistedIndex};

use super::chunker::{TextChunk, TextChunker};
use super::parser::PdfParser;

/// Builds a [`PersistedIndex`] from source PDFs
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    batch_size: usize,
}

impl IndexBuilder {
    /// Create a builder embedding `batch_size` chunks per request
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, chunker: TextChunker, batch_size: usize) -> Self {
        Self {
            embedder,
            chunker,
            batch_size: batch_size.max(1),
        }
    }

    /// Parse and chunk every PDF in `paths`
    pub fn collect_chunks(&self, paths: &[PathBuf]) -> Result<Vec<TextChunk>> {
        let mut chunks = Vec::new();

        for path in paths {
            let source = source_name(path);
            let data = std::fs::read(path)
                .map_err(|e| Error::file_parse(&source, format!("cannot read file: {}", e)))?;

            let parsed = PdfParser::parse(&source, &data)?;
            let doc_chunks = self.chunker.chunk_document(&parsed);

            tracing::info!(
                "{}: {} of {} pages with text, {} chars, {} chunks",
                source,
                parsed.pages.len(),
                parsed.total_pages,
                parsed.char_count(),
                doc_chunks.len()
            );
            chunks.extend(doc_chunks);
        }

        Ok(chunks)
    }

    /// Embed `chunks` in batches; `on_batch` receives the number of chunks
    /// finished so far
    pub async fn embed_chunks<F>(&self, chunks: Vec<TextChunk>, mut on_batch: F) -> Result<PersistedIndex>
    where
        F: FnMut(usize),
    {
        if chunks.is_empty() {
            return Err(Error::embedding("No text chunks to index"));
        }

        let mut index = PersistedIndex::new(self.embedder.model(), self.embedder.dimensions());
        index.entries.reserve(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(vectors) {
                index.entries.push(IndexEntry::new(
                    chunk.source.clone(),
                    chunk.page,
                    chunk.content.clone(),
                    embedding,
                ));
            }
            on_batch(index.entries.len());
        }

        // The service decides the real vector size
        if let Some(actual) = index.entries.first().map(|e| e.embedding.len()) {
            if actual != index.dimensions {
                tracing::warn!(
                    "Configured {} dimensions but {} returned {}; using {}",
                    index.dimensions,
                    self.embedder.model(),
                    actual,
                    actual
                );
                index.dimensions = actual;
            }
        }

        index.validate().map_err(Error::embedding)?;
        Ok(index)
    }
}

/// File name recorded as the entry source
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
