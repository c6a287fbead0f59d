//! Shared text helpers: sentence segmentation, stop words, query words.

use once_cell::sync::Lazy;
use regex::Regex;

/// English stop words excluded from TF-IDF vocabulary and lookup queries.
pub static STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "do", "for", "from",
    "has", "have", "in", "is", "it", "its", "lay", "of", "on", "or", "that", "the", "their",
    "there", "these", "this", "to", "was", "we", "were", "which", "will", "with",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Split text into sentences on terminal punctuation, dropping fragments
/// of 10 characters or fewer.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| s.len() > 10)
        .map(str::to_string)
        .collect()
}

/// Sentence segmentation that keeps the terminal punctuation attached,
/// used where the original sentence form matters (claim extraction).
pub fn split_sentences_with_bounds(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            // Swallow runs of terminators ("..", "?!")
            while let Some(&(_, next)) = iter.peek() {
                if matches!(next, '.' | '!' | '?') {
                    iter.next();
                } else {
                    break;
                }
            }
            let end = iter.peek().map(|&(j, _)| j).unwrap_or(text.len());
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
            let _ = i;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

/// Extract up to `max_words` meaningful lowercase words from a title for
/// use as a search query. Stop words and single letters are skipped.
pub fn get_query_words(title: &str, max_words: usize) -> Vec<String> {
    WORD_RE
        .find_iter(title)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() > 1 && !is_stop_word(w))
        .take(max_words)
        .collect()
}

/// Truncate to at most `max_words` whitespace-separated words.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.trim().to_string();
    }
    words[..max_words].join(" ")
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_short_fragments() {
        let parts = split_sentences("Dr. This is a proper sentence here. Ok.");
        assert_eq!(parts, vec!["This is a proper sentence here".to_string()]);
    }

    #[test]
    fn split_with_bounds_keeps_terminators() {
        let parts = split_sentences_with_bounds("First sentence. Is this a question? Yes!");
        assert_eq!(parts, vec!["First sentence.", "Is this a question?", "Yes!"]);
    }

    #[test]
    fn split_with_bounds_collapses_runs() {
        let parts = split_sentences_with_bounds("Wait... what?! Done.");
        assert_eq!(parts, vec!["Wait...", "what?!", "Done."]);
    }

    #[test]
    fn query_words_skip_stop_words_and_initials() {
        let words = get_query_words("A Study of the Effects of X on Networks", 4);
        assert_eq!(words, vec!["study", "effects", "networks"]);
    }

    #[test]
    fn truncate_words_caps_length() {
        assert_eq!(truncate_words("one two three four", 2), "one two");
        assert_eq!(truncate_words("one two", 5), "one two");
    }
}
