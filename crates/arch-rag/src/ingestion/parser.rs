//! PDF text extraction, page by page

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// How long the whole-document fallback may run before it is abandoned
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Text of one PDF page
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Cleaned text content
    pub content: String,
}

/// A parsed source document
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    /// File name used as the `source` of every entry
    pub source: String,
    /// Pages that yielded text
    pub pages: Vec<PageText>,
    /// Page count reported by the document
    pub total_pages: u32,
}

impl ParsedPdf {
    /// Total extracted characters
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.content.chars().count()).sum()
    }
}

/// PDF parser: `lopdf` per page, `pdf-extract` as a whole-document fallback
pub struct PdfParser;

impl PdfParser {
    /// Parse PDF bytes; `source` names the document in errors and entries
    pub fn parse(source: &str, data: &[u8]) -> Result<ParsedPdf> {
        let (pages, total_pages) = match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                let total = page_numbers.len() as u32;

                let pages: Vec<PageText> = page_numbers
                    .into_iter()
                    .filter_map(|page_number| match doc.extract_text(&[page_number]) {
                        Ok(text) => Some(PageText {
                            page_number,
                            content: clean_text(&text),
                        }),
                        Err(e) => {
                            tracing::debug!("{}: no text on page {}: {}", source, page_number, e);
                            None
                        }
                    })
                    .filter(|p| !p.content.is_empty())
                    .collect();

                (pages, total)
            }
            Err(e) => {
                tracing::warn!("{}: lopdf could not load document: {}", source, e);
                (Vec::new(), 0)
            }
        };

        if !pages.is_empty() {
            return Ok(ParsedPdf {
                source: source.to_string(),
                pages,
                total_pages,
            });
        }

        tracing::warn!("{}: per-page extraction found no text, trying pdf-extract", source);
        let content = clean_text(&Self::extract_with_timeout(source, data)?);
        if content.is_empty() {
            return Err(Error::file_parse(
                source,
                "No text content could be extracted; the PDF may be image-based",
            ));
        }

        Ok(ParsedPdf {
            source: source.to_string(),
            pages: vec![PageText {
                page_number: 1,
                content,
            }],
            total_pages: total_pages.max(1),
        })
    }

    /// Run `pdf-extract` on a worker thread so a pathological font cannot
    /// hang the build
    fn extract_with_timeout(source: &str, data: &[u8]) -> Result<String> {
        let data = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text_from_mem(&data));
        });

        match rx.recv_timeout(FALLBACK_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(Error::file_parse(source, format!("pdf-extract failed: {}", e)))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::file_parse(
                source,
                format!("pdf-extract timed out after {}s", FALLBACK_TIMEOUT.as_secs()),
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::file_parse(source, "pdf-extract worker crashed"))
            }
        }
    }
}

/// Normalize typographic characters and drop blank lines
fn clean_text(text: &str) -> String {
    text.replace('\0', "")
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Minimal PDF with one line of Courier text per page
    fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_pages_are_numbered_from_one() {
        let data = sample_pdf(&["Launch an instance", "Attach an EBS volume"]);
        let parsed = PdfParser::parse("ec2-ug.pdf", &data).unwrap();

        assert_eq!(parsed.source, "ec2-ug.pdf");
        assert_eq!(parsed.total_pages, 2);
        assert_eq!(parsed.pages.len(), 2);
        assert_eq!(parsed.pages[0].page_number, 1);
        assert!(parsed.pages[0].content.contains("Launch"));
        assert_eq!(parsed.pages[1].page_number, 2);
        assert!(parsed.pages[1].content.contains("EBS"));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = PdfParser::parse("broken.pdf", b"not a pdf").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(
            clean_text("  \u{201C}ssh\u{201D} \u{2013} key\n\n\n  pair\u{0}  "),
            "\"ssh\" - key\npair"
        );
    }
}
