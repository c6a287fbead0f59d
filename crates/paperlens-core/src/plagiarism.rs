//! Plagiarism scoring against the local corpus.
//!
//! Documents are represented as TF-IDF-weighted unigram+bigram vectors over
//! a vocabulary built from the document plus every eligible corpus entry.
//! The score is the maximum cosine similarity across the corpus, reported on
//! the 0–100 percent scale; common terms are discounted by smoothed IDF
//! rather than excluded outright, so an identical pair still scores ~100.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusEntry;
use crate::text::is_stop_word;
use crate::{Config, PlagiarismMatch};

/// Corpus entries shorter than this are noise and skipped.
const MIN_ENTRY_CHARS: usize = 100;

/// At most this many matches are reported.
const MAX_MATCHES: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlagiarismReport {
    /// Maximum similarity across the corpus, 0–100, one decimal.
    pub score: f64,
    /// Entries above the materiality threshold, score descending.
    pub matches: Vec<PlagiarismMatch>,
}

#[derive(Clone)]
pub struct PlagiarismScorer {
    /// Materiality threshold on the 0–1 similarity scale.
    threshold: f64,
}

impl PlagiarismScorer {
    pub fn new(config: &Config) -> Self {
        Self {
            threshold: config.match_threshold,
        }
    }

    /// Compare `text` against every corpus entry.
    ///
    /// An empty corpus yields a zero score and no matches; that is not an
    /// error.
    pub fn score(&self, text: &str, corpus: &[CorpusEntry]) -> PlagiarismReport {
        if text.trim().len() < MIN_ENTRY_CHARS {
            return PlagiarismReport::default();
        }

        let eligible: Vec<&CorpusEntry> = corpus
            .iter()
            .filter(|e| e.text.trim().len() >= MIN_ENTRY_CHARS)
            .collect();
        if eligible.is_empty() {
            return PlagiarismReport::default();
        }

        let doc_terms = tokenize(text);
        let corpus_terms: Vec<Vec<String>> = eligible.iter().map(|e| tokenize(&e.text)).collect();

        // Document frequency over the whole comparison set
        let n_docs = 1 + corpus_terms.len();
        let mut df: HashMap<&str, usize> = HashMap::new();
        for terms in std::iter::once(&doc_terms).chain(corpus_terms.iter()) {
            let unique: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        // Smoothed IDF, as in standard TF-IDF weighting: terms shared by
        // most of the comparison set are damped toward the floor of 1.0.
        let idf: HashMap<&str, f64> = df
            .iter()
            .map(|(&term, &count)| {
                let weight = ((1.0 + n_docs as f64) / (1.0 + count as f64)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        let doc_vec = weigh(&doc_terms, &idf);

        let mut scored: Vec<(String, f64)> = eligible
            .iter()
            .zip(corpus_terms.iter())
            .map(|(entry, terms)| {
                let sim = cosine(&doc_vec, &weigh(terms, &idf));
                (entry.id.clone(), sim)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let max_sim = scored.first().map(|(_, s)| *s).unwrap_or(0.0);
        let matches = scored
            .into_iter()
            .filter(|(_, sim)| *sim > self.threshold)
            .take(MAX_MATCHES)
            .map(|(source_id, sim)| PlagiarismMatch {
                source_id,
                score: to_percent(sim),
            })
            .collect();

        PlagiarismReport {
            score: to_percent(max_sim),
            matches,
        }
    }
}

fn to_percent(similarity: f64) -> f64 {
    (similarity.clamp(0.0, 1.0) * 1000.0).round() / 10.0
}

/// Lowercase word tokens with stop words removed, plus adjacent-word
/// bigrams over the filtered sequence.
fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !is_stop_word(w))
        .collect();

    let mut terms = words.clone();
    for pair in words.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

fn weigh<'a>(terms: &'a [String], idf: &HashMap<&str, f64>) -> HashMap<&'a str, f64> {
    let mut tf: HashMap<&str, f64> = HashMap::new();
    for term in terms {
        *tf.entry(term.as_str()).or_insert(0.0) += 1.0;
    }
    for (term, weight) in tf.iter_mut() {
        *weight *= idf.get(term).copied().unwrap_or(1.0);
    }
    tf
}

fn cosine(a: &HashMap<&str, f64>, b: &HashMap<&str, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    let norm_a: f64 = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
