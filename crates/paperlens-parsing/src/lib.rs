//! Citation extraction from research-paper text: references-section
//! location, per-entry segmentation, and best-effort title cleaning.

mod section;
mod segment;
mod title;

pub use section::find_references_section;
pub use segment::segment_citations;
pub use title::clean_citation_title;

/// A single citation pulled out of the references section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCitation {
    /// The entry exactly as it appeared (whitespace-joined across lines).
    pub raw_text: String,
    /// Best-effort title for bibliographic lookup.
    pub cleaned_title: String,
}

/// Extract up to `max` citations from full document text.
///
/// A document with no references section yields an empty list; that is not
/// an error. Entries under 10 characters are discarded as segmentation
/// noise.
pub fn extract_citations(text: &str, max: usize) -> Vec<ExtractedCitation> {
    let Some(section) = find_references_section(text) else {
        return Vec::new();
    };

    segment_citations(section, max)
        .into_iter()
        .filter(|raw| raw.trim().len() >= 10)
        .map(|raw| {
            let cleaned_title = clean_citation_title(&raw);
            ExtractedCitation {
                raw_text: raw,
                cleaned_title,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_without_references_yields_nothing() {
        let text = "Introduction\nThis paper has no bibliography at all.\nConclusion\n";
        assert!(extract_citations(text, 50).is_empty());
    }

    #[test]
    fn smith_and_doe_scenario() {
        let text =
            "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n\n2. Doe, A. Some Other Work.\n";
        let citations = extract_citations(text, 50);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].cleaned_title, "A Study of Things");
        assert!(citations[1].cleaned_title.contains("Some Other Work"));
    }

    #[test]
    fn order_matches_document_order() {
        let text = "References\n[1] First entry about alpha systems.\n[2] Second entry about beta systems.\n[3] Third entry about gamma systems.\n";
        let citations = extract_citations(text, 50);
        let raws: Vec<&str> = citations.iter().map(|c| c.raw_text.as_str()).collect();
        assert_eq!(raws.len(), 3);
        assert!(raws[0].contains("alpha"));
        assert!(raws[1].contains("beta"));
        assert!(raws[2].contains("gamma"));
    }

    #[test]
    fn cap_is_enforced() {
        let mut text = String::from("References\n");
        for i in 1..=60 {
            text.push_str(&format!("{i}. Entry number {i} with enough text to keep.\n"));
        }
        assert_eq!(extract_citations(&text, 50).len(), 50);
    }
}
