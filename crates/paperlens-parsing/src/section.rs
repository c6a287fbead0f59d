use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:references|bibliography|works\s+cited)[ \t]*:?[ \t]*$").unwrap()
});

/// Locate the references region: everything after the last line that is a
/// references/bibliography header by itself. The header must occupy its own
/// line; the words appearing in running prose do not count. Papers sometimes
/// mention "References" before the actual list (table captions, section
/// cross-references), hence the last match. `None` when the document has no
/// header line.
pub fn find_references_section(text: &str) -> Option<&str> {
    let m = HEADER_RE.find_iter(text).last()?;
    Some(&text[m.end()..])
}
