//! Answer post-processing: script normalization and markdown rendering

pub mod markdown;
pub mod patches;
pub mod script;

pub use markdown::MarkdownRenderer;
pub use patches::{apply_patches, flatten_nested_list_markers, HtmlPatch, PATCH_PIPELINE};
pub use script::ScriptNormalizer;
