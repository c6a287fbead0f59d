//! Title normalization and fuzzy comparison for citation validation.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalize a title for comparison: NFKD-decompose, strip to ASCII
/// alphanumerics, lowercase.
pub fn normalize_title(title: &str) -> String {
    let decomposed: String = title.nfkd().filter(|c| c.is_ascii()).collect();

    static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());
    NON_ALNUM.replace_all(&decomposed, "").to_lowercase()
}

/// Fuzzy title comparison at a 90% threshold, with prefix tolerance for
/// subtitles the bibliographic service appends.
pub fn titles_match(title_a: &str, title_b: &str) -> bool {
    let norm_a = normalize_title(title_a);
    let norm_b = normalize_title(title_b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return false;
    }

    let score = rapidfuzz::fuzz::ratio(norm_a.chars(), norm_b.chars());
    if score >= 0.90 {
        return true;
    }

    let (shorter, longer) = if norm_a.len() <= norm_b.len() {
        (&norm_a, &norm_b)
    } else {
        (&norm_b, &norm_a)
    };

    // Prefix matching only for titles long enough to be distinctive
    shorter.len() >= 25 && longer.starts_with(shorter.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_title("A Study of Things: Part II!"),
            "astudyofthingspartii"
        );
    }

    #[test]
    fn accents_fold_to_ascii() {
        assert_eq!(normalize_title("Rényi Entropy"), "renyientropy");
    }

    #[test]
    fn near_identical_titles_match() {
        assert!(titles_match(
            "Attention is all you need",
            "Attention Is All You Need."
        ));
    }

    #[test]
    fn unrelated_titles_do_not_match() {
        assert!(!titles_match(
            "Attention is all you need",
            "A survey of graph databases"
        ));
    }

    #[test]
    fn subtitle_prefix_matches() {
        assert!(titles_match(
            "Distributed consensus in asynchronous networks",
            "Distributed consensus in asynchronous networks: a survey and taxonomy"
        ));
    }

    #[test]
    fn empty_never_matches() {
        assert!(!titles_match("", "anything"));
    }
}
