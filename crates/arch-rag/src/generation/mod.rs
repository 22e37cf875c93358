//! Prompt assembly and the question-answering pipeline

pub mod pipeline;
pub mod prompt;

pub use pipeline::AskPipeline;
pub use prompt::PromptBuilder;
