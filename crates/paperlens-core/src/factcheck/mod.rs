//! Fact-checking of candidate claims via an external claim-review service.
//!
//! Claims are checked sequentially with a fixed inter-claim delay and
//! per-claim retry with backoff, to stay inside external rate limits.

pub mod google;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::claims::{extract_claims, sanitize_query};
use crate::{ClaimStatus, ClaimVerdict, Config, FactCheckReview};

#[derive(Error, Debug, Clone)]
pub enum FactCheckError {
    #[error("fact-check credentials rejected")]
    Unauthorized,
    #[error("fact-check request timed out")]
    Timeout,
    #[error("fact-check request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FactCheckError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FactCheckError::Timeout
        } else {
            FactCheckError::Request(e.to_string())
        }
    }
}

/// An external claim-review service.
pub trait FactCheckBackend: Send + Sync {
    fn name(&self) -> &str;

    fn check<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FactCheckReview>, FactCheckError>> + Send + 'a>>;
}

/// Rating keywords that settle a claim as verified.
const VERIFIED_WORDS: &[&str] = &["true", "correct", "accurate"];

/// Rating keywords that settle a claim as contradicted.
const CONTRADICTED_WORDS: &[&str] = &["false", "incorrect", "misleading"];

/// Extracts claims from document text and fact-checks each one.
///
/// With no backend configured, every claim comes back `NotConfigured`.
#[derive(Clone)]
pub struct FactChecker {
    backend: Option<Arc<dyn FactCheckBackend>>,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    delay: Duration,
    max_claims: usize,
}

impl FactChecker {
    pub fn new(config: &Config, client: &reqwest::Client) -> Self {
        let backend = config
            .factcheck_api_key
            .clone()
            .map(|api_key| Arc::new(google::GoogleFactCheck { api_key }) as Arc<dyn FactCheckBackend>);
        Self {
            backend,
            client: client.clone(),
            timeout: Duration::from_secs(config.factcheck_timeout_secs),
            max_retries: config.factcheck_max_retries.max(1),
            delay: Duration::from_millis(config.factcheck_delay_ms),
            max_claims: config.max_claims,
        }
    }

    /// Construct with an explicit backend (or none), bypassing configuration.
    pub fn with_backend(
        backend: Option<Arc<dyn FactCheckBackend>>,
        client: reqwest::Client,
        timeout: Duration,
        max_retries: u32,
        delay: Duration,
        max_claims: usize,
    ) -> Self {
        Self {
            backend,
            client,
            timeout,
            max_retries: max_retries.max(1),
            delay,
            max_claims,
        }
    }

    /// Extract candidate claims from `text` and fact-check them in order.
    pub async fn check_text(&self, text: &str, cancel: &CancellationToken) -> Vec<ClaimVerdict> {
        let claims = extract_claims(text, self.max_claims);
        if claims.is_empty() {
            return vec![];
        }

        let Some(backend) = &self.backend else {
            debug!(claims = claims.len(), "fact-check backend not configured");
            return claims
                .into_iter()
                .map(|claim_text| ClaimVerdict {
                    claim_text,
                    status: ClaimStatus::NotConfigured,
                    evidence: vec![],
                    error: Some("no fact-check API key configured".to_string()),
                })
                .collect();
        };

        let mut verdicts = Vec::with_capacity(claims.len());
        for (i, claim) in claims.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("fact-checking cancelled with claims outstanding");
                break;
            }
            // Fixed inter-claim delay to respect service rate limits
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }

            let Some(query) = sanitize_query(&claim) else {
                verdicts.push(ClaimVerdict {
                    claim_text: claim,
                    status: ClaimStatus::NotConfigured,
                    evidence: vec![],
                    error: Some("claim empty after sanitization".to_string()),
                });
                continue;
            };

            let verdict = match self.check_with_retry(backend.as_ref(), &query).await {
                Ok(evidence) => verdict_from_evidence(claim, evidence),
                Err(e) => ClaimVerdict {
                    claim_text: claim,
                    status: ClaimStatus::ApiError,
                    evidence: vec![],
                    error: Some(e.to_string()),
                },
            };
            verdicts.push(verdict);
        }
        verdicts
    }

    async fn check_with_retry(
        &self,
        backend: &dyn FactCheckBackend,
        query: &str,
    ) -> Result<Vec<FactCheckReview>, FactCheckError> {
        let mut attempt = 1u32;
        loop {
            match backend.check(query, &self.client, self.timeout).await {
                Ok(evidence) => return Ok(evidence),
                // Bad credentials will not improve on retry
                Err(FactCheckError::Unauthorized) => return Err(FactCheckError::Unauthorized),
                Err(e) if attempt < self.max_retries => {
                    warn!(
                        backend = backend.name(),
                        attempt,
                        error = %e,
                        "fact-check attempt failed, backing off"
                    );
                    tokio::time::sleep(self.delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Settle a claim's status from its published reviews: the first review
/// whose rating carries a known keyword decides.
fn verdict_from_evidence(claim_text: String, evidence: Vec<FactCheckReview>) -> ClaimVerdict {
    let mut status = ClaimStatus::NoVerdict;
    for review in &evidence {
        let rating = review.rating.to_lowercase();
        if VERIFIED_WORDS.iter().any(|w| rating.contains(w)) {
            status = ClaimStatus::Verified;
            break;
        }
        if CONTRADICTED_WORDS.iter().any(|w| rating.contains(w)) {
            status = ClaimStatus::Contradicted;
            break;
        }
    }
    ClaimVerdict {
        claim_text,
        status,
        evidence,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockFactCheck, MockFactCheckResponse};
    use super::*;

    const CLAIM: &str = "The measured latency increased by forty percent under sustained load.";

    fn review(rating: &str) -> FactCheckReview {
        FactCheckReview {
            publisher: "Example Checker".to_string(),
            url: Some("https://example.org/review".to_string()),
            rating: rating.to_string(),
            title: None,
        }
    }

    fn checker_with(backend: Option<Arc<dyn FactCheckBackend>>) -> FactChecker {
        FactChecker::with_backend(
            backend,
            reqwest::Client::new(),
            Duration::from_secs(8),
            3,
            Duration::from_millis(500),
            20,
        )
    }

    #[tokio::test]
    async fn unconfigured_marks_every_claim() {
        let checker = checker_with(None);
        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].status, ClaimStatus::NotConfigured);
        assert!(verdicts[0].error.is_some());
    }

    #[tokio::test]
    async fn verified_rating_keyword_settles_claim() {
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![
            review("Mostly True"),
        ])));
        let checker = checker_with(Some(mock));
        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts[0].status, ClaimStatus::Verified);
        assert_eq!(verdicts[0].evidence.len(), 1);
    }

    #[tokio::test]
    async fn contradicted_rating_keyword_settles_claim() {
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![
            review("Pants on Fire! False."),
        ])));
        let checker = checker_with(Some(mock));
        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts[0].status, ClaimStatus::Contradicted);
    }

    #[tokio::test]
    async fn unknown_rating_or_no_reviews_is_no_verdict() {
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![
            review("Unproven"),
        ])));
        let checker = checker_with(Some(mock));
        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts[0].status, ClaimStatus::NoVerdict);

        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![])));
        let checker = checker_with(Some(mock));
        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts[0].status, ClaimStatus::NoVerdict);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_after_timeouts_with_increasing_backoff() {
        let mock = Arc::new(MockFactCheck::with_sequence(vec![
            MockFactCheckResponse::Timeout,
            MockFactCheckResponse::Timeout,
            MockFactCheckResponse::Found(vec![review("True")]),
        ]));
        let checker = checker_with(Some(mock.clone()));

        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts[0].status, ClaimStatus::Verified);
        assert_eq!(mock.call_count(), 3);

        // Backoff is delay x attempt: 500ms after the first failure,
        // 1000ms after the second.
        let times = mock.call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(500));
        assert_eq!(times[2] - times[1], Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_exhausted_into_api_error() {
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Error(
            "HTTP 503".to_string(),
        )));
        let checker = checker_with(Some(mock.clone()));

        let verdicts = checker.check_text(CLAIM, &CancellationToken::new()).await;
        assert_eq!(verdicts[0].status, ClaimStatus::ApiError);
        assert!(verdicts[0].error.as_deref().unwrap().contains("HTTP 503"));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn claims_are_spaced_by_the_inter_claim_delay() {
        let text = format!(
            "{} {}",
            "The first experiment finished in under four seconds every time.",
            "The second experiment finished in under nine seconds every time."
        );
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![])));
        let checker = checker_with(Some(mock.clone()));

        let verdicts = checker.check_text(&text, &CancellationToken::new()).await;
        assert_eq!(verdicts.len(), 2);

        let times = mock.call_times();
        assert_eq!(times[1] - times[0], Duration::from_millis(500));
    }

    #[tokio::test]
    async fn unsendable_claim_is_skipped_without_a_call() {
        // Long enough to pass extraction, nothing left after sanitization
        let text = "(".repeat(45);
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![])));
        let checker = checker_with(Some(mock.clone()));

        let verdicts = checker.check_text(&text, &CancellationToken::new()).await;
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].status, ClaimStatus::NotConfigured);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_token_stops_the_batch() {
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![])));
        let checker = checker_with(Some(mock.clone()));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let verdicts = checker.check_text(CLAIM, &cancel).await;
        assert!(verdicts.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn verdicts_preserve_claim_order() {
        let text = "The alpha system processed one million records in a minute. \
                    The beta system processed two million records in a minute.";
        let mock = Arc::new(MockFactCheck::new(MockFactCheckResponse::Found(vec![])));
        let checker = checker_with(Some(mock));

        let verdicts = checker.check_text(text, &CancellationToken::new()).await;
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts[0].claim_text.contains("alpha"));
        assert!(verdicts[1].claim_text.contains("beta"));
    }
}
