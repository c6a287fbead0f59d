//! Heuristic critique engine: methodology, writing, and limitations
//! analysis over raw document text. No external calls; a pure function
//! of the text, safe to run concurrently with the network-bound stages.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::CritiqueReport;

const MAX_SUGGESTIONS: usize = 8;

// Absence findings referenced by the suggestion rules below.
const NO_METHOD_TERMS: &str = "Limited methodology terminology detected";
const NO_SAMPLE_SIZE: &str = "No explicit sample size found";
const NO_STATS: &str = "Limited statistical analysis terminology";
const NO_LIMITATIONS: &str = "No explicit limitations discussion found";
const NO_GENERALIZABILITY: &str = "Limited discussion of generalizability";
const NO_DATA_AVAILABILITY: &str = "No mention of data or code availability";

/// Run every heuristic over the document text.
pub fn critique(text: &str) -> CritiqueReport {
    let lower = text.to_lowercase();

    let methodology = analyze_methodology(&lower);
    let writing_flags = analyze_writing(text, &lower);
    let limitations = analyze_limitations(&lower);
    let suggestions = build_suggestions(&lower, &methodology, &writing_flags, &limitations);

    CritiqueReport {
        methodology,
        writing_flags,
        limitations,
        suggestions,
    }
}

const METHODOLOGY_CATEGORIES: &[(&str, &[&str])] = &[
    ("experiment", &["experiment", "experimental", "trial"]),
    ("survey", &["survey", "questionnaire", "poll"]),
    ("interview", &["interview", "interviews", "interviewed"]),
    (
        "qualitative",
        &["qualitative", "thematic analysis", "grounded theory"],
    ),
    ("quantitative", &["quantitative", "statistical", "numerical"]),
    (
        "sample_size",
        &["sample size", "n =", "participants", "subjects"],
    ),
    (
        "randomized",
        &["randomized", "random assignment", "control group"],
    ),
    ("bias", &["bias", "confounding", "threats to validity"]),
];

const STATS_TERMS: &[&str] = &[
    "p-value",
    "p <",
    "significant",
    "correlation",
    "regression",
    "anova",
    "t-test",
    "chi-square",
    "effect size",
    "confidence interval",
];

static SAMPLE_SIZE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"n\s*=\s*(\d+)").unwrap(),
        Regex::new(r"sample size[^\d]*(\d+)").unwrap(),
        Regex::new(r"(\d+)\s+participants").unwrap(),
        Regex::new(r"(\d+)\s+subjects").unwrap(),
    ]
});

fn analyze_methodology(lower: &str) -> Vec<String> {
    let mut findings = Vec::new();

    let found: Vec<&str> = METHODOLOGY_CATEGORIES
        .iter()
        .filter(|(_, terms)| terms.iter().any(|t| lower.contains(t)))
        .map(|(category, _)| *category)
        .collect();
    if found.is_empty() {
        findings.push(NO_METHOD_TERMS.to_string());
    } else {
        findings.push(format!("Methodology terms found: {}", found.join(", ")));
    }

    let max_sample: Option<u64> = SAMPLE_SIZE_RES
        .iter()
        .flat_map(|re| re.captures_iter(lower))
        .filter_map(|c| c[1].parse::<u64>().ok())
        .max();
    match max_sample {
        Some(n) if n < 30 => findings.push(format!("Small sample size detected (n={n})")),
        Some(n) => findings.push(format!("Sample size mentioned (n={n})")),
        None => findings.push(NO_SAMPLE_SIZE.to_string()),
    }

    let found_stats: Vec<&str> = STATS_TERMS
        .iter()
        .filter(|t| lower.contains(*t))
        .copied()
        .collect();
    if found_stats.is_empty() {
        findings.push(NO_STATS.to_string());
    } else {
        let shown: Vec<&str> = found_stats.into_iter().take(3).collect();
        findings.push(format!("Statistical analysis: {}", shown.join(", ")));
    }

    findings
}

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

static PASSIVE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bwas\s+\w+ed\b").unwrap(),
        Regex::new(r"(?i)\bwere\s+\w+ed\b").unwrap(),
        Regex::new(r"(?i)\bbeen\s+\w+ed\b").unwrap(),
        Regex::new(r"(?i)\bis\s+\w+ed\b").unwrap(),
        Regex::new(r"(?i)\bare\s+\w+ed\b").unwrap(),
    ]
});

const HEDGE_WORDS: &[&str] = &[
    "might",
    "could",
    "may",
    "possibly",
    "perhaps",
    "seems to",
    "appears to",
    "suggests that",
    "indicates that",
];

const JARGON_WORDS: &[&str] = &[
    "aforementioned",
    "heretofore",
    "wherein",
    "whereby",
    "thereof",
    "utilize",
    "facilitate",
    "implement",
    "methodology",
];

fn analyze_writing(text: &str, lower: &str) -> Vec<String> {
    let mut flags = Vec::new();

    let lengths: Vec<usize> = SENTENCE_RE
        .split(text)
        .filter(|s| s.trim().len() > 5)
        .map(|s| s.split_whitespace().count())
        .collect();

    if !lengths.is_empty() {
        let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        if avg > 25.0 {
            flags.push(format!("Long average sentence length ({avg:.1} words)"));
        } else if avg < 10.0 {
            flags.push(format!("Short average sentence length ({avg:.1} words)"));
        }

        let passive: usize = PASSIVE_RES.iter().map(|re| re.find_iter(text).count()).sum();
        let ratio = passive as f64 / lengths.len() as f64;
        if ratio > 0.3 {
            flags.push(format!("High passive voice usage ({:.1}%)", ratio * 100.0));
        }
    }

    let words = text.split_whitespace().count();
    let hedges: usize = HEDGE_WORDS.iter().map(|w| lower.matches(w).count()).sum();
    if hedges as f64 > words as f64 * 0.02 {
        flags.push("Frequent hedging language detected".to_string());
    }

    let jargon: usize = JARGON_WORDS.iter().map(|w| lower.matches(w).count()).sum();
    if jargon > 10 {
        flags.push("Academic jargon may affect readability".to_string());
    }

    flags
}

const LIMITATIONS_TERMS: &[&str] = &[
    "limitation",
    "limitations",
    "threats to validity",
    "scope",
    "boundary",
    "constraint",
    "restriction",
];

const GENERALIZABILITY_TERMS: &[&str] = &[
    "generaliz",
    "external validity",
    "broader population",
    "applicability",
    "transferability",
];

const DATA_TERMS: &[&str] = &[
    "data available",
    "dataset",
    "code available",
    "reproducible",
    "replication",
    "open data",
    "github",
    "repository",
];

const ETHICS_TERMS: &[&str] = &[
    "ethics",
    "ethical",
    "consent",
    "irb",
    "institutional review",
    "privacy",
    "confidentiality",
    "anonymous",
];

fn analyze_limitations(lower: &str) -> Vec<String> {
    let present = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));
    let mut findings = Vec::new();

    if present(LIMITATIONS_TERMS) {
        findings.push("Limitations section present".to_string());
    } else {
        findings.push(NO_LIMITATIONS.to_string());
    }

    if present(GENERALIZABILITY_TERMS) {
        findings.push("Generalizability addressed".to_string());
    } else {
        findings.push(NO_GENERALIZABILITY.to_string());
    }

    if present(DATA_TERMS) {
        findings.push("Data/code availability mentioned".to_string());
    } else {
        findings.push(NO_DATA_AVAILABILITY.to_string());
    }

    if present(ETHICS_TERMS) {
        findings.push("Ethical considerations addressed".to_string());
    } else {
        findings.push("Limited ethical considerations discussion".to_string());
    }

    findings
}

const NOVELTY_TERMS: &[&str] = &["novel", "new", "innovative", "first", "original"];

/// Fixed rule table, in priority order, capped at [`MAX_SUGGESTIONS`].
fn build_suggestions(
    lower: &str,
    methodology: &[String],
    writing_flags: &[String],
    limitations: &[String],
) -> Vec<String> {
    let has = |findings: &[String], marker: &str| findings.iter().any(|f| f == marker);
    let flagged = |prefix: &str| writing_flags.iter().any(|f| f.starts_with(prefix));

    let mut suggestions: Vec<String> = Vec::new();

    if has(methodology, NO_METHOD_TERMS) {
        suggestions.push("Add detailed methodology section with research design".to_string());
    }
    if has(methodology, NO_SAMPLE_SIZE) {
        suggestions.push("Include sample size and participant demographics".to_string());
    }
    if has(methodology, NO_STATS) {
        suggestions.push("Report statistical tests and effect sizes".to_string());
    }
    if flagged("Long average sentence length") {
        suggestions
            .push("Consider shorter, clearer sentences for better readability".to_string());
    }
    if flagged("High passive voice") {
        suggestions.push("Reduce passive voice for more direct writing".to_string());
    }
    if flagged("Academic jargon") {
        suggestions.push("Simplify technical language where possible".to_string());
    }
    if has(limitations, NO_LIMITATIONS) {
        suggestions.push("Add dedicated limitations section".to_string());
    }
    if has(limitations, NO_GENERALIZABILITY) {
        suggestions.push("Discuss generalizability and external validity".to_string());
    }
    if has(limitations, NO_DATA_AVAILABILITY) {
        suggestions.push("Consider making data and analysis code available".to_string());
    }

    let novelty: usize = NOVELTY_TERMS.iter().map(|w| lower.matches(w).count()).sum();
    if novelty < 3 {
        suggestions.push("Clarify the novel contributions of this work".to_string());
    }
    if !lower.contains("future work") && !lower.contains("future research") {
        suggestions.push("Include discussion of future research directions".to_string());
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_text_yields_absence_findings_and_capped_suggestions() {
        let report = critique("A short note about nothing in particular.");
        assert!(report.methodology.contains(&NO_METHOD_TERMS.to_string()));
        assert!(report.methodology.contains(&NO_SAMPLE_SIZE.to_string()));
        assert!(report.limitations.contains(&NO_LIMITATIONS.to_string()));
        assert_eq!(report.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(
            report.suggestions[0],
            "Add detailed methodology section with research design"
        );
    }

    #[test]
    fn small_sample_size_is_flagged() {
        let report = critique("We ran an experiment with n = 12 participants in total.");
        assert!(
            report
                .methodology
                .iter()
                .any(|f| f == "Small sample size detected (n=12)")
        );
    }

    #[test]
    fn adequate_sample_size_is_reported() {
        let report = critique("The survey reached 200 participants across three sites.");
        assert!(
            report
                .methodology
                .iter()
                .any(|f| f == "Sample size mentioned (n=200)")
        );
    }

    #[test]
    fn methodology_terms_are_categorized() {
        let report =
            critique("Our experiment used a randomized control group and statistical analysis.");
        let finding = &report.methodology[0];
        assert!(finding.starts_with("Methodology terms found:"));
        assert!(finding.contains("experiment"));
        assert!(finding.contains("randomized"));
    }

    #[test]
    fn long_sentences_are_flagged_with_a_matching_suggestion() {
        let sentence = "This single sentence keeps accumulating clause after clause with \
                        more and more words so that the average length across the entire \
                        document easily exceeds the twenty five word threshold used here.";
        let report = critique(sentence);
        assert!(
            report
                .writing_flags
                .iter()
                .any(|f| f.starts_with("Long average sentence length"))
        );
        assert!(
            report
                .suggestions
                .iter()
                .any(|s| s.contains("shorter, clearer sentences"))
        );
    }

    #[test]
    fn passive_voice_heavy_text_is_flagged() {
        let text = "The samples were collected daily. The results were analyzed carefully. \
                    The data was cleaned thoroughly. The experiment was repeated twice.";
        let report = critique(text);
        assert!(
            report
                .writing_flags
                .iter()
                .any(|f| f.starts_with("High passive voice usage"))
        );
    }

    #[test]
    fn present_limitations_suppress_the_suggestion() {
        let text = "We discuss the limitations of our approach, its generalizability to a \
                    broader population, our open data release on github, and the ethical \
                    consent process approved by the irb.";
        let report = critique(text);
        assert!(
            report
                .limitations
                .contains(&"Limitations section present".to_string())
        );
        assert!(
            !report
                .suggestions
                .iter()
                .any(|s| s == "Add dedicated limitations section")
        );
    }

    #[test]
    fn critique_is_deterministic() {
        let text = "An experiment with 40 participants was conducted and analyzed.";
        assert_eq!(critique(text), critique(text));
    }
}
