//! Markdown to HTML rendering for model answers
//!
//! Extensions: fenced code with highlight markup, tables, heading anchors
//! for a table of contents, and footnotes. Raw HTML in answers is escaped.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

use super::patches::{apply_patches, flatten_nested_list_markers, HtmlPatch, PATCH_PIPELINE};

/// Language class used for fenced blocks without an info string
const PLAIN_CODE_LANGUAGE: &str = "text";

/// Markdown renderer with the answer-page extension set
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    patches: Vec<HtmlPatch>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            options,
            patches: PATCH_PIPELINE.to_vec(),
        }
    }
}

impl MarkdownRenderer {
    /// Create a renderer with the standard patch pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Render markdown to patched HTML
    pub fn render(&self, markdown: &str) -> String {
        let html = self.render_unpatched(&flatten_nested_list_markers(markdown));
        apply_patches(&html, &self.patches)
    }

    /// Render markdown to HTML without any textual corrections
    pub fn render_unpatched(&self, markdown: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options)
            .map(escape_raw_html)
            .collect();

        let events = assign_heading_ids(events);
        let events = highlight_code_blocks(events);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

/// Raw HTML from the model is shown as text
fn escape_raw_html(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    }
}

/// Give every heading a slug id so the page can build a table of contents
fn assign_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < events.len() {
        let needs_id = matches!(&events[i], Event::Start(Tag::Heading { id: None, .. }));
        if !needs_id {
            i += 1;
            continue;
        }

        let mut text = String::new();
        let mut j = i + 1;
        while j < events.len() {
            match &events[j] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
            j += 1;
        }

        let id = unique_slug(&slugify(&text), &mut seen);
        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
            *slot = Some(CowStr::from(id));
        }
        i = j;
    }

    events
}

/// Wrap code blocks in a `codehilite` container and make sure each carries a
/// language class
fn highlight_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string)
                        .unwrap_or_default(),
                    CodeBlockKind::Indented => String::new(),
                };
                let language = if language.is_empty() {
                    PLAIN_CODE_LANGUAGE.to_string()
                } else {
                    language
                };

                out.push(Event::Html(CowStr::from("<div class=\"codehilite\">\n")));
                out.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(
                    CowStr::from(language),
                ))));
            }
            Event::End(TagEnd::CodeBlock) => {
                out.push(Event::End(TagEnd::CodeBlock));
                out.push(Event::Html(CowStr::from("</div>\n")));
            }
            other => out.push(other),
        }
    }

    out
}

/// Lowercase slug keeping letters (including CJK) and digits
fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "_".to_string()
    } else {
        slug
    }
}

/// Suffix repeated slugs with `_1`, `_2`, ...
fn unique_slug(slug: &str, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(slug.to_string()).or_insert(0);
    let id = if *count == 0 {
        slug.to_string()
    } else {
        format!("{}_{}", slug, count)
    };
    *count += 1;
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_code_highlight_markup() {
        let html = MarkdownRenderer::new().render("```bash\naws ec2 run-instances\n```\n");
        assert!(html.contains("<div class=\"codehilite\">\n<pre><code class=\"language-bash\">"));
        assert!(html.contains("aws ec2 run-instances"));
        assert!(html.contains("</code></pre>\n</div>"));
        // Fenced blocks must not be rewrapped by the inline-code patch
        assert!(!html.contains("<pre><pre>"));
    }

    #[test]
    fn test_unlabelled_block_gets_class() {
        let html = MarkdownRenderer::new().render("```\nls -l\n```\n");
        assert!(html.contains("class=\"language-text\""));
        assert!(!html.contains("<pre><pre>"));
    }

    #[test]
    fn test_inline_code_shown_as_block() {
        let html = MarkdownRenderer::new().render("Run `aws configure` first.");
        assert!(html.contains("<pre><code>aws configure</code></pre>"));
    }

    #[test]
    fn test_tables() {
        let md = "| 類型 | vCPU |\n|---|---|\n| t3.micro | 2 |\n";
        let html = MarkdownRenderer::new().render(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>t3.micro</td>"));
    }

    #[test]
    fn test_footnotes() {
        let html = MarkdownRenderer::new().render("EC2 is elastic[^1].\n\n[^1]: Amazon EC2.\n");
        assert!(html.contains("footnote-reference"));
        assert!(html.contains("footnote-definition"));
    }

    #[test]
    fn test_heading_ids() {
        let html = MarkdownRenderer::new().render("# 啟動 EC2 執行個體\n\n## Step 1\n\n## Step 1\n");
        assert!(html.contains("<h1 id=\"啟動-ec2-執行個體\">"));
        assert!(html.contains("<h2 id=\"step-1\">"));
        assert!(html.contains("<h2 id=\"step-1_1\">"));
    }

    #[test]
    fn test_br_in_table_cell_becomes_newline() {
        let md = "| 步驟 | 說明 |\n|---|---|\n| 1 | 開啟主控台<br>選擇區域 |\n";
        let html = MarkdownRenderer::new().render(md);
        assert!(html.contains("開啟主控台\n選擇區域"));
        assert!(!html.contains("&lt;br&gt;"));
    }

    #[test]
    fn test_raw_html_escaped() {
        let html = MarkdownRenderer::new().render("<script>alert(1)</script>\n");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_nested_list_marker_flattened() {
        let html = MarkdownRenderer::new().render("1. 開啟主控台\n\n   - 選擇區域\n");
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("選擇區域"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello,  World! "), "hello-world");
        assert_eq!(slugify("!!!"), "_");
    }
}
