//! Pipeline orchestrator: runs the analysis stages concurrently over one
//! extracted document, isolating failures per stage.
//!
//! A stage that errors or panics contributes its documented default to the
//! aggregate; only the minimum-length gate and text extraction abort a
//! request outright.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::citations::CitationValidator;
use crate::corpus::CorpusStore;
use crate::critique;
use crate::factcheck::FactChecker;
use crate::plagiarism::{PlagiarismReport, PlagiarismScorer};
use crate::summarize::Summarizer;
use crate::{AnalysisResult, Config, CritiqueReport, Document, PipelineError};

/// Substituted when the summary stage fails outright.
pub const SUMMARY_FAILURE_MESSAGE: &str = "Unable to generate summary due to processing error.";

/// All five analysis stages plus the length gate, assembled once at
/// startup and shared across requests.
#[derive(Clone)]
pub struct Pipeline {
    summarizer: Summarizer,
    scorer: PlagiarismScorer,
    citations: CitationValidator,
    factchecker: FactChecker,
    min_text_chars: usize,
}

impl Pipeline {
    pub fn new(config: &Config, client: &reqwest::Client) -> Self {
        Self {
            summarizer: Summarizer::new(config, client),
            scorer: PlagiarismScorer::new(config),
            citations: CitationValidator::new(config, client),
            factchecker: FactChecker::new(config, client),
            min_text_chars: config.min_text_chars,
        }
    }

    /// Assemble from explicitly constructed stages.
    pub fn with_stages(
        summarizer: Summarizer,
        scorer: PlagiarismScorer,
        citations: CitationValidator,
        factchecker: FactChecker,
        min_text_chars: usize,
    ) -> Self {
        Self {
            summarizer,
            scorer,
            citations,
            factchecker,
            min_text_chars,
        }
    }

    /// Analyze one document against the corpus.
    ///
    /// Always returns a fully populated [`AnalysisResult`] once the length
    /// gate passes; degraded stages carry their defaults.
    pub async fn analyze(
        &self,
        document: &Document,
        corpus: &CorpusStore,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        let start = Instant::now();

        let chars = document.text.trim().chars().count();
        if chars < self.min_text_chars {
            return Err(PipelineError::TooShort {
                chars,
                min: self.min_text_chars,
            });
        }

        let text = document.text.clone();

        // Each stage runs in its own task: an error or panic in one
        // degrades to that stage's default without touching the others.
        let summary_task = tokio::spawn({
            let summarizer = self.summarizer.clone();
            let text = text.clone();
            async move { summarizer.summarize(&text).await }
        });
        let plagiarism_task = tokio::task::spawn_blocking({
            let scorer = self.scorer.clone();
            let entries = corpus.entries();
            let text = text.clone();
            move || scorer.score(&text, &entries)
        });
        let citations_task = tokio::spawn({
            let validator = self.citations.clone();
            let text = text.clone();
            let cancel = cancel.clone();
            async move { validator.validate_text(&text, &cancel).await }
        });
        let claims_task = tokio::spawn({
            let checker = self.factchecker.clone();
            let text = text.clone();
            let cancel = cancel.clone();
            async move { checker.check_text(&text, &cancel).await }
        });
        let critique_task = tokio::task::spawn_blocking({
            let text = text.clone();
            move || critique::critique(&text)
        });

        let (summary, plagiarism, citations, claims, critique) = tokio::join!(
            summary_task,
            plagiarism_task,
            citations_task,
            claims_task,
            critique_task
        );

        let summary = match summary {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                warn!(error = %e, "summary stage failed, substituting default");
                SUMMARY_FAILURE_MESSAGE.to_string()
            }
            Err(e) => {
                warn!(error = %e, "summary stage panicked, substituting default");
                SUMMARY_FAILURE_MESSAGE.to_string()
            }
        };
        let plagiarism = plagiarism.unwrap_or_else(|e| {
            warn!(error = %e, "plagiarism stage failed, substituting default");
            PlagiarismReport::default()
        });
        let citations = citations.unwrap_or_else(|e| {
            warn!(error = %e, "citation stage failed, substituting default");
            vec![]
        });
        let claims = claims.unwrap_or_else(|e| {
            warn!(error = %e, "fact-check stage failed, substituting default");
            vec![]
        });
        let critique = critique.unwrap_or_else(|e| {
            warn!(error = %e, "critique stage failed, substituting default");
            CritiqueReport::default()
        });

        let processing = start.elapsed();
        info!(
            elapsed_ms = processing.as_millis() as u64,
            citations = citations.len(),
            claims = claims.len(),
            plagiarism_score = plagiarism.score,
            "analysis complete"
        );

        Ok(AnalysisResult {
            summary,
            plagiarism_score: plagiarism.score,
            plagiarism_sources: plagiarism.matches,
            citations,
            claims,
            critique,
            processing,
        })
    }
}
