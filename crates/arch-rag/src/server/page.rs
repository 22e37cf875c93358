//! HTML page for the browser form

use crate::types::{AnswerPair, RetrievedSnippet};

const TEMPLATE: &str = include_str!("../../templates/main.html");

/// Empty question form
pub fn form_page() -> String {
    fill(TEMPLATE, &[("question", ""), ("notices", ""), ("answers", "")])
}

/// Form with the question kept and both answers side by side
pub fn answer_page(question: &str, answer: &AnswerPair) -> String {
    let notices: String = answer
        .notices
        .iter()
        .map(|n| format!("  <p class=\"notice\">{}</p>\n", escape_html(n)))
        .collect();

    let mut answers = String::new();
    answers.push_str("  <div class=\"answers\">\n");
    answers.push_str("    <section class=\"answer\">\n      <h2>RAG 回答</h2>\n");
    answers.push_str(&answer.rag_html);
    answers.push_str(&references(&answer.retrieval.primary, &answer.retrieval.secondary));
    answers.push_str("    </section>\n");
    answers.push_str("    <section class=\"answer\">\n      <h2>一般回答</h2>\n");
    answers.push_str(&answer.plain_html);
    answers.push_str("    </section>\n  </div>\n");

    fill(
        TEMPLATE,
        &[
            ("question", &escape_html(question)),
            ("notices", &notices),
            ("answers", &answers),
        ],
    )
}

fn references(primary: &RetrievedSnippet, secondary: &RetrievedSnippet) -> String {
    format!(
        "      <p class=\"references\">參考：{} 第 {} 頁（{:.3}）、{} 第 {} 頁（{:.3}）</p>\n",
        escape_html(&primary.source),
        primary.page,
        primary.score,
        escape_html(&secondary.source),
        secondary.page,
        secondary.score
    )
}

/// Replace `{{key}}` markers in one pass so inserted values are never rescanned
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
