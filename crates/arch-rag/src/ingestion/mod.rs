//! Index building: PDF parsing, chunking and batch embedding

mod builder;
mod chunker;
mod parser;

pub use builder::IndexBuilder;
pub use chunker::{TextChunk, TextChunker};
pub use parser::{PageText, ParsedPdf, PdfParser};
