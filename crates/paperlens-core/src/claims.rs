//! Candidate-claim extraction and query sanitization for fact-checking.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::text::split_sentences_with_bounds;

/// Sentences shorter than this are unlikely to be factual claims.
const MIN_CLAIM_CHARS: usize = 40;

/// Sanitized queries are truncated to roughly this many characters.
const MAX_QUERY_CHARS: usize = 120;

/// Interrogative openers that mark a sentence as a question.
const QUESTION_STARTS: &[&str] = &["How", "What", "Why", "Where", "When"];

/// Openers that mark a sentence as a header or caption, not a claim.
const HEADER_STARTS: &[&str] = &["Figure", "Table", "References"];

/// Inline citation markers like `[3]` or `[1, 2]`.
static BRACKET_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+(?:\s*,\s*\d+)*\]").unwrap());

/// Characters stripped outright during query sanitization.
const STRIPPED_CHARS: &str = "\"'\u{201c}\u{201d}\u{2018}\u{2019}()[]{}<>";

/// Extract up to `max` candidate claim sentences, earliest first.
pub fn extract_claims(text: &str, max: usize) -> Vec<String> {
    let sentences = split_sentences_with_bounds(text);
    let total = sentences.len();

    let claims: Vec<String> = sentences
        .into_iter()
        .filter(|s| is_candidate(s))
        .take(max)
        .collect();

    debug!(claims = claims.len(), sentences = total, "extracted candidate claims");
    claims
}

fn is_candidate(sentence: &str) -> bool {
    if sentence.len() < MIN_CLAIM_CHARS {
        return false;
    }
    if sentence.ends_with('?') || QUESTION_STARTS.iter().any(|p| sentence.starts_with(p)) {
        return false;
    }
    if is_all_caps(sentence) || HEADER_STARTS.iter().any(|p| sentence.starts_with(p)) {
        return false;
    }
    if BRACKET_MARKER_RE.is_match(sentence) {
        return false;
    }
    true
}

fn is_all_caps(s: &str) -> bool {
    let mut has_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    has_alpha
}

/// Clean a claim for use as an external search query.
///
/// Strips control and quote/bracket characters, collapses repeated
/// punctuation and whitespace, and truncates to about 120 characters
/// preferring a sentence boundary, then a word boundary. Returns `None`
/// when nothing sendable remains.
pub fn sanitize_query(claim: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(claim.len());
    let mut prev: Option<char> = None;
    for c in claim.chars() {
        if (c.is_control() && !c.is_whitespace()) || STRIPPED_CHARS.contains(c) {
            continue;
        }
        if c.is_ascii_punctuation() && prev == Some(c) {
            continue;
        }
        cleaned.push(c);
        prev = Some(c);
    }

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = truncate_query(&collapsed);
    let trimmed = truncated.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn truncate_query(s: &str) -> String {
    let cut = match s.char_indices().nth(MAX_QUERY_CHARS) {
        Some((idx, _)) => idx,
        None => return s.to_string(),
    };
    let window = &s[..cut];

    if let Some(pos) = window.rfind(['.', '!', '?']) {
        if pos > 0 {
            return window[..=pos].trim().to_string();
        }
    }
    if let Some(pos) = window.rfind(' ') {
        return window[..pos].trim().to_string();
    }
    window.to_string()
}
