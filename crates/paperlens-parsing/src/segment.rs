use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns that start a new citation entry: numbered markers or an
/// "Author, A." surname block.
static NEW_ENTRY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d+\.").unwrap(),
        Regex::new(r"^\[\d+\]").unwrap(),
        Regex::new(r"^\(\d+\)").unwrap(),
        Regex::new(r"^[A-Z][a-z]+,\s*[A-Z]").unwrap(),
    ]
});

fn starts_new_citation(line: &str) -> bool {
    NEW_ENTRY_RES.iter().any(|re| re.is_match(line))
}

/// Split a references region into individual citation entries.
///
/// A line starts a new entry when it matches a numbered-entry or author
/// pattern; otherwise it continues the current entry. A blank line closes
/// the current entry unconditionally. At most `max` entries are returned.
pub fn segment_citations(section: &str, max: usize) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in section.lines() {
        if citations.len() >= max {
            return citations;
        }

        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                citations.push(std::mem::take(&mut current));
            }
            continue;
        }

        if starts_new_citation(line) {
            if !current.is_empty() {
                citations.push(std::mem::take(&mut current));
            }
            current = line.to_string();
        } else if current.is_empty() {
            current = line.to_string();
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }

    if !current.is_empty() && citations.len() < max {
        citations.push(current);
    }
    citations
}
