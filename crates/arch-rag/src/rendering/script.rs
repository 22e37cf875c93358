//! Simplified to Traditional Chinese normalization of model answers

use zhconv::{zhconv, Variant};

/// Converts answers to Traditional Chinese before rendering
///
/// Conversion is character and phrase based, so ASCII text, markdown syntax
/// and code survive unchanged.
#[derive(Debug, Clone, Copy)]
pub struct ScriptNormalizer {
    target: Variant,
}

impl Default for ScriptNormalizer {
    fn default() -> Self {
        Self {
            target: Variant::ZhHant,
        }
    }
}

impl ScriptNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert `text` to the target script
    pub fn normalize(&self, text: &str) -> String {
        if text.is_ascii() {
            return text.to_string();
        }
        zhconv(text, self.target)
    }
}
