use std::path::Path;

use thiserror::Error;

use crate::Document;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw output of a PDF extraction backend, before the pipeline's
/// minimum-length gate is applied.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub word_count: usize,
    pub title: Option<String>,
}

impl From<ExtractedDocument> for Document {
    fn from(e: ExtractedDocument) -> Self {
        Document {
            text: e.text,
            word_count: e.word_count,
            title: e.title,
        }
    }
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the low-level text and metadata extraction step;
/// everything downstream (summarization, scoring, citation and claim
/// analysis) operates on the extracted [`Document`].
pub trait PdfBackend: Send + Sync {
    /// Extract text, word count, and a best-effort title from a PDF file.
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, BackendError>;
}

/// Resolve a document title from extracted text when metadata has none.
///
/// Scans the first 10 lines for one that is 10–200 characters and does not
/// begin with a structural section keyword.
pub fn title_from_text(text: &str) -> Option<String> {
    const SECTION_KEYWORDS: [&str; 4] = ["abstract", "references", "introduction", "keywords"];

    for line in text.lines().take(10) {
        let line = line.trim();
        if line.len() <= 10 || line.len() >= 200 {
            continue;
        }
        let lower = line.to_lowercase();
        if SECTION_KEYWORDS.iter().any(|k| lower.starts_with(k)) {
            continue;
        }
        return Some(line.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_skips_section_headers() {
        let text = "Abstract and some words here\nA Study of Interesting Things\nmore body text";
        assert_eq!(
            title_from_text(text).as_deref(),
            Some("A Study of Interesting Things")
        );
    }

    #[test]
    fn title_skips_short_and_long_lines() {
        let long = "x".repeat(250);
        let text = format!("short\n{long}\nThe Actual Paper Title Line\n");
        assert_eq!(
            title_from_text(&text).as_deref(),
            Some("The Actual Paper Title Line")
        );
    }

    #[test]
    fn title_none_when_nothing_qualifies() {
        assert_eq!(title_from_text("abstract\nintro\n"), None);
    }
}
