//! Textual corrections applied around markdown rendering
//!
//! Model answers use a few constructs the renderer does not display the way
//! the page expects. The fixes are plain string rewrites, so they are kept
//! here as named steps with a fixed order: each step assumes the ones before
//! it have already run.

use regex::Regex;
use std::sync::OnceLock;

/// Markdown-level rewrite applied before rendering: second-level list items
/// (`"   - "`) become block quotes.
pub fn flatten_nested_list_markers(markdown: &str) -> String {
    markdown.replace("   - ", ">")
}

/// A single post-render HTML correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlPatch {
    /// Inline `<code>` spans are shown as blocks: `<code>..</code>` becomes
    /// `<pre><code>..</code></pre>`
    WrapCodeInPre,
    /// Escaped `<br>` markers become real newlines
    UnescapeLineBreaks,
    /// A list marker left in front of a rewrapped code block is dropped:
    /// `- <pre><code>` becomes `<pre><code>`
    StripListMarkerBeforeCode,
    /// An answer that opens with "- `cmd`" loses the closing backtick
    TrimLeadingInlineCode,
}

/// The post-render patches, in the order they must run
pub const PATCH_PIPELINE: [HtmlPatch; 4] = [
    HtmlPatch::WrapCodeInPre,
    HtmlPatch::UnescapeLineBreaks,
    HtmlPatch::StripListMarkerBeforeCode,
    HtmlPatch::TrimLeadingInlineCode,
];

fn bare_code_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<code>(.*?)</code>").expect("valid regex"))
}

fn leading_inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(- `)(.*?)`").expect("valid regex"))
}

impl HtmlPatch {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            HtmlPatch::WrapCodeInPre => "wrap_code_in_pre",
            HtmlPatch::UnescapeLineBreaks => "unescape_line_breaks",
            HtmlPatch::StripListMarkerBeforeCode => "strip_list_marker_before_code",
            HtmlPatch::TrimLeadingInlineCode => "trim_leading_inline_code",
        }
    }

    /// Apply this patch
    pub fn apply(&self, html: &str) -> String {
        match self {
            // Only class-less <code> is rewrapped; fenced blocks always carry
            // a language class and are already inside <pre>.
            HtmlPatch::WrapCodeInPre => bare_code_span()
                .replace_all(html, "<pre><code>${1}</code></pre>")
                .into_owned(),
            HtmlPatch::UnescapeLineBreaks => html.replace("&lt;br&gt;", "\n"),
            HtmlPatch::StripListMarkerBeforeCode => html.replace("- <pre><code>", "<pre><code>"),
            HtmlPatch::TrimLeadingInlineCode => leading_inline_code()
                .replace(html, "${1}${2}")
                .into_owned(),
        }
    }
}

/// Run `patches` in the given order
pub fn apply_patches(html: &str, patches: &[HtmlPatch]) -> String {
    patches
        .iter()
        .fold(html.to_string(), |acc, patch| patch.apply(&acc))
}
