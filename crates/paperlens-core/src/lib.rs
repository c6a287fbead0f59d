use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod citations;
pub mod claims;
pub mod config;
pub mod corpus;
pub mod critique;
pub mod factcheck;
pub mod lookup;
pub mod matching;
pub mod pipeline;
pub mod plagiarism;
pub mod summarize;
pub mod text;

// Re-export for convenience
pub use backend::{BackendError, ExtractedDocument, PdfBackend};
pub use config::Config;
pub use corpus::{CorpusEntry, CorpusStore, StoreError};
pub use pipeline::Pipeline;
pub use text::{get_query_words, split_sentences};

/// Immutable extracted payload for one uploaded document.
///
/// Derived once per upload by a [`PdfBackend`]; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub word_count: usize,
    pub title: Option<String>,
}

impl Document {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = text.split_whitespace().count();
        Self {
            text,
            word_count,
            title: None,
        }
    }
}

/// Validation status of a single extracted citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    Valid,
    NotFound,
    Timeout,
    Error,
}

/// One citation from the references section, finalized by validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationRecord {
    /// The citation text as it appeared in the references section.
    pub raw_text: String,
    /// Best-effort extracted title used for lookup queries.
    pub cleaned_title: String,
    pub status: CitationStatus,
    pub doi: Option<String>,
    /// Title returned by the bibliographic service, when it resembles ours.
    pub matched_title: Option<String>,
}

/// Fact-check verdict classification for one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Verified,
    Contradicted,
    NoVerdict,
    ApiError,
    NotConfigured,
}

/// A published review backing a fact-check verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckReview {
    pub publisher: String,
    pub url: Option<String>,
    pub rating: String,
    pub title: Option<String>,
}

/// Outcome of fact-checking a single extracted claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimVerdict {
    /// The original sentence as extracted from the document.
    pub claim_text: String,
    pub status: ClaimStatus,
    pub evidence: Vec<FactCheckReview>,
    pub error: Option<String>,
}

/// Heuristic critique of methodology, writing, and limitations.
///
/// Pure function of the document text; see [`critique::critique`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CritiqueReport {
    pub methodology: Vec<String>,
    pub writing_flags: Vec<String>,
    pub limitations: Vec<String>,
    pub suggestions: Vec<String>,
}

/// A corpus entry that scored above the materiality threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismMatch {
    pub source_id: String,
    /// Similarity on the 0–100 percent scale, one decimal.
    pub score: f64,
}

/// Aggregate produced by [`Pipeline::analyze`].
///
/// Every field is always populated: a failed stage contributes its
/// documented default rather than an absent key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    /// Maximum corpus similarity on the 0–100 percent scale.
    pub plagiarism_score: f64,
    /// Matching corpus entries, score descending, capped at 10.
    pub plagiarism_sources: Vec<PlagiarismMatch>,
    /// In document order.
    pub citations: Vec<CitationRecord>,
    /// In document order.
    pub claims: Vec<ClaimVerdict>,
    pub critique: CritiqueReport,
    /// Wall-clock time the pipeline spent on this document.
    #[serde(with = "duration_ms")]
    pub processing: Duration,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Fatal pipeline errors. Everything else degrades to stage defaults.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("document text too short for analysis ({chars} chars, need at least {min})")]
    TooShort { chars: usize, min: usize },
    #[error("text extraction failed: {0}")]
    Extraction(#[from] BackendError),
}
