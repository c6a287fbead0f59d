use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d+\.\s*").unwrap(),
        Regex::new(r"^\[\d+\]\s*").unwrap(),
        Regex::new(r"^\(\d+\)\s*").unwrap(),
    ]
});

static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)"|“([^”]+)”"#).unwrap());

static LEADING_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(?\d{4}\)?\.?\s*").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9'-]*").unwrap());

const VENUE_MARKERS: [&str; 10] = [
    "journal",
    "proceedings",
    "conference",
    "vol",
    "volume",
    "pp",
    "pages",
    "doi",
    "issn",
    "retrieved",
];

fn looks_like_venue(text: &str) -> bool {
    let lower = text.to_lowercase();
    VENUE_MARKERS.iter().any(|m| lower.contains(m))
}

fn plausible_title(text: &str) -> bool {
    text.len() > 5 && text.len() < 160
}

/// Extract a probable work title from one raw citation entry.
///
/// Cascade: quoted substring, then the text segment after the author block
/// (first period) that does not look like venue metadata, then the first
/// 5–15 title-like words after skipping initials and year tokens, then a
/// raw-text prefix as last resort.
pub fn clean_citation_title(raw: &str) -> String {
    let mut citation = raw.trim().to_string();
    for re in LEADING_NUMBER_RES.iter() {
        citation = re.replace(&citation, "").into_owned();
    }
    let citation = citation.trim();

    // 1. Quoted titles are the strongest signal
    if let Some(caps) = QUOTED_RE.captures(citation) {
        let quoted = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if plausible_title(quoted) {
            return quoted.to_string();
        }
    }

    // 2. Segment after the author block, skipping year markers and venue-ish text
    let parts: Vec<&str> = citation.split('.').collect();
    for part in parts.iter().skip(1) {
        let candidate = LEADING_YEAR_RE.replace(part.trim(), "");
        let candidate = candidate.trim();
        if plausible_title(candidate) && !looks_like_venue(candidate) {
            return candidate.to_string();
        }
    }

    // 3. First run of title-like words after leading initials/years
    let words: Vec<&str> = WORD_RE.find_iter(citation).map(|m| m.as_str()).collect();
    let mut start = 0;
    for (i, word) in words.iter().take(5).enumerate() {
        let is_initial = word.len() <= 2 && word.chars().all(|c| c.is_ascii_alphabetic());
        let is_year = word.chars().all(|c| c.is_ascii_digit());
        if is_initial || is_year {
            start = i + 1;
        } else {
            break;
        }
    }
    let title = words
        .iter()
        .skip(start)
        .take(15)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if plausible_title(&title) {
        return title;
    }

    // 4. Raw prefix fallback
    let prefix: String = citation.chars().take(100).collect();
    let prefix = prefix.trim();
    if prefix.len() > 5 {
        prefix.to_string()
    } else {
        citation.chars().take(50).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_title_wins() {
        let raw = r#"[3] Smith, J. "Deep Learning for Citation Analysis," IEEE Transactions, 2019."#;
        assert_eq!(
            clean_citation_title(raw),
            "Deep Learning for Citation Analysis,"
        );
    }

    #[test]
    fn segment_after_author_block() {
        let raw = "1. Smith, J. (2020). A Study of Things. Journal X.";
        assert_eq!(clean_citation_title(raw), "A Study of Things");
    }

    #[test]
    fn venue_segments_are_skipped() {
        let raw = "2. Brown, K. (2018). Proceedings of the 10th Conference, pp. 1-10. Measuring Network Latency. Elsevier.";
        assert_eq!(clean_citation_title(raw), "Measuring Network Latency");
    }

    #[test]
    fn word_fallback_skips_initials_and_year() {
        let raw = "A B 2020 Improving the reliability of distributed queues without punctuation marks anywhere near";
        let title = clean_citation_title(raw);
        assert!(title.starts_with("Improving the reliability"));
        assert!(!title.contains("2020"));
    }

    #[test]
    fn short_citation_falls_back_to_prefix() {
        let raw = "9. Anonymous note";
        assert_eq!(clean_citation_title(raw), "Anonymous note");
    }
}
