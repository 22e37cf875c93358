//! Sentence-bounded text chunking with page tracking

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;

use super::parser::ParsedPdf;

/// A chunk of page text ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Source document file name
    pub source: String,
    /// 1-based page the chunk came from
    pub page: u32,
    /// Chunk text
    pub content: String,
}

/// Text chunker with configurable size and overlap, measured in characters
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size / 2),
            min_size: 50,
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap).with_min_size(config.min_chunk_size)
    }

    /// Set the minimum chunk size
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Chunk every page of a parsed document; chunks never span pages
    pub fn chunk_document(&self, doc: &ParsedPdf) -> Vec<TextChunk> {
        doc.pages
            .iter()
            .flat_map(|page| {
                self.chunk_text(&page.content)
                    .into_iter()
                    .map(move |content| TextChunk {
                        source: doc.source.clone(),
                        page: page.page_number,
                        content,
                    })
            })
            .collect()
    }

    /// Split text into overlapping chunks at sentence boundaries
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in text.split_sentence_bounds() {
            let sentence_len = sentence.chars().count();

            // A single oversized sentence is split on character boundaries
            if sentence_len > self.chunk_size {
                let chars: Vec<char> = sentence.chars().collect();
                for piece in chars.chunks(self.chunk_size) {
                    self.make_room(&mut chunks, &mut current, &mut current_len, piece.len());
                    current.extend(piece);
                    current_len += piece.len();
                }
                continue;
            }

            self.make_room(&mut chunks, &mut current, &mut current_len, sentence_len);
            current.push_str(sentence);
            current_len += sentence_len;
        }

        self.push_chunk(&mut chunks, &current);
        chunks
    }

    /// Flush `current` when `incoming` more characters would not fit, carrying
    /// the overlap forward only if the incoming text still fits after it
    fn make_room(
        &self,
        chunks: &mut Vec<String>,
        current: &mut String,
        current_len: &mut usize,
        incoming: usize,
    ) {
        if *current_len == 0 || *current_len + incoming <= self.chunk_size {
            return;
        }

        self.push_chunk(chunks, current);
        *current = self.overlap_text(current);
        *current_len = current.chars().count();

        if *current_len + incoming > self.chunk_size {
            current.clear();
            *current_len = 0;
        }
    }

    fn push_chunk(&self, chunks: &mut Vec<String>, text: &str) {
        let trimmed = text.trim();
        if trimmed.chars().count() >= self.min_size {
            chunks.push(trimmed.to_string());
        }
    }

    /// Overlap text from the end of a chunk, starting at a sentence or word
    /// boundary when one is available
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }

        let total = text.chars().count();
        if total <= self.overlap {
            return text.to_string();
        }

        let start = text
            .char_indices()
            .nth(total - self.overlap)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let tail = &text[start..];

        for boundary in [". ", "。"] {
            if let Some(pos) = tail.find(boundary) {
                let rest = &tail[pos + boundary.len()..];
                if !rest.trim().is_empty() {
                    return rest.to_string();
                }
            }
        }

        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}
