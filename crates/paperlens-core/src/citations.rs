//! Citation validation against bibliographic lookup services.
//!
//! Extraction (section location, segmentation, title cleaning) lives in
//! `paperlens-parsing`; this module takes the extracted entries and resolves
//! each against the configured lookup services concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use paperlens_parsing::ExtractedCitation;

use crate::lookup::{LookupBackend, LookupError, build_lookup_list};
use crate::matching::titles_match;
use crate::text::get_query_words;
use crate::{CitationRecord, CitationStatus, Config};

/// Raw citation text longer than this is truncated before being used as a
/// search query.
const MAX_RAW_QUERY_CHARS: usize = 200;

/// Queries shorter than this are too unspecific to send.
const MIN_QUERY_CHARS: usize = 5;

/// At most this many citations run their query cascades at once; the rest
/// wait on a semaphore permit. Keeps a 50-citation document from opening 50
/// simultaneous cascades against the lookup services.
const MAX_CONCURRENT_LOOKUPS: usize = 4;

/// Validates extracted citations against lookup services in priority order.
///
/// Cheap to clone; lookup backends are shared via `Arc`.
#[derive(Clone)]
pub struct CitationValidator {
    backends: Vec<Arc<dyn LookupBackend>>,
    client: reqwest::Client,
    timeout: Duration,
    max_citations: usize,
}

impl CitationValidator {
    pub fn new(config: &Config, client: &reqwest::Client) -> Self {
        Self {
            backends: build_lookup_list(config),
            client: client.clone(),
            timeout: Duration::from_secs(config.lookup_timeout_secs),
            max_citations: config.max_citations,
        }
    }

    /// Construct with explicit backends, bypassing configuration.
    pub fn with_backends(
        backends: Vec<Arc<dyn LookupBackend>>,
        client: reqwest::Client,
        timeout: Duration,
        max_citations: usize,
    ) -> Self {
        Self {
            backends,
            client,
            timeout,
            max_citations,
        }
    }

    /// Extract citations from `text` and validate each concurrently.
    ///
    /// Records come back in document order. Cancellation aborts outstanding
    /// lookups and returns whatever finished.
    pub async fn validate_text(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Vec<CitationRecord> {
        let citations = paperlens_parsing::extract_citations(text, self.max_citations);
        if citations.is_empty() {
            debug!("no references section or no citations extracted");
            return vec![];
        }

        let total = citations.len();
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_LOOKUPS));
        let mut join_set = JoinSet::new();
        for (i, citation) in citations.into_iter().enumerate() {
            let validator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // Closed only by abort_all, which tears the task down anyway
                let _permit = semaphore.acquire().await;
                let record = validator.validate_one(&citation).await;
                (i, record)
            });
        }

        let mut slots: Vec<Option<CitationRecord>> = vec![None; total];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("citation validation cancelled with lookups outstanding");
                    join_set.abort_all();
                    break;
                }
                next = join_set.join_next() => match next {
                    None => break,
                    Some(Ok((i, record))) => slots[i] = Some(record),
                    Some(Err(_)) => continue,
                },
            }
        }

        slots.into_iter().flatten().collect()
    }

    /// Resolve one citation: cascade queries over the backends in priority
    /// order, accepting the first query that returns at least one hit.
    async fn validate_one(&self, citation: &ExtractedCitation) -> CitationRecord {
        let queries = build_queries(citation);
        let mut saw_timeout = false;
        let mut saw_error = false;

        for query in &queries {
            for backend in &self.backends {
                match backend.search(query, &self.client, self.timeout).await {
                    Ok(hits) if !hits.is_empty() => {
                        let resembling = hits
                            .iter()
                            .find(|h| titles_match(&citation.cleaned_title, &h.title));
                        let hit = resembling.unwrap_or(&hits[0]);
                        return CitationRecord {
                            raw_text: citation.raw_text.clone(),
                            cleaned_title: citation.cleaned_title.clone(),
                            status: CitationStatus::Valid,
                            doi: hit.doi.clone(),
                            matched_title: resembling.map(|h| h.title.clone()),
                        };
                    }
                    Ok(_) => {}
                    Err(LookupError::Timeout) => {
                        debug!(backend = backend.name(), "lookup timed out");
                        saw_timeout = true;
                    }
                    Err(LookupError::Request(msg)) => {
                        debug!(backend = backend.name(), error = %msg, "lookup failed");
                        saw_error = true;
                    }
                }
            }
        }

        let status = if saw_timeout {
            CitationStatus::Timeout
        } else if saw_error {
            CitationStatus::Error
        } else {
            CitationStatus::NotFound
        };

        CitationRecord {
            raw_text: citation.raw_text.clone(),
            cleaned_title: citation.cleaned_title.clone(),
            status,
            doi: None,
            matched_title: None,
        }
    }
}

/// Build the query cascade: raw citation text, cleaned title, then a
/// short keyword summary. Deduplicated, too-short entries dropped.
fn build_queries(citation: &ExtractedCitation) -> Vec<String> {
    let mut queries: Vec<String> = Vec::with_capacity(3);
    let mut push = |q: String| {
        if q.len() >= MIN_QUERY_CHARS && !queries.contains(&q) {
            queries.push(q);
        }
    };

    push(truncate_chars(&citation.raw_text, MAX_RAW_QUERY_CHARS).to_string());
    push(citation.cleaned_title.clone());
    push(get_query_words(&citation.cleaned_title, 4).join(" "));

    queries
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::mock::{MockLookup, MockLookupResponse};

    const SMITH_DOE: &str =
        "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n\n2. Doe, A. Some Other Work.\n";

    fn validator_with(mocks: Vec<Arc<MockLookup>>) -> CitationValidator {
        let backends: Vec<Arc<dyn LookupBackend>> = mocks
            .into_iter()
            .map(|m| m as Arc<dyn LookupBackend>)
            .collect();
        CitationValidator::with_backends(
            backends,
            reqwest::Client::new(),
            Duration::from_secs(1),
            50,
        )
    }

    #[tokio::test]
    async fn first_query_hit_is_valid_with_doi() {
        let mock = Arc::new(MockLookup::finding(
            "CrossRef",
            "A Study of Things",
            Some("10.1000/xyz"),
        ));
        let validator = validator_with(vec![mock.clone()]);

        let text = "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n";
        let records = validator
            .validate_text(text, &CancellationToken::new())
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, CitationStatus::Valid);
        assert_eq!(records[0].doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(records[0].matched_title.as_deref(), Some("A Study of Things"));
        // Raw text matched immediately, no cascade needed
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn query_cascade_falls_back_to_keywords() {
        let mock = Arc::new(MockLookup::with_sequence(
            "CrossRef",
            vec![
                MockLookupResponse::Empty,
                MockLookupResponse::Empty,
                MockLookupResponse::Found(vec![crate::lookup::BibMatch {
                    title: "A Study of Things".to_string(),
                    doi: None,
                    authors: vec![],
                }]),
            ],
        ));
        let validator = validator_with(vec![mock.clone()]);

        let text = "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n";
        let records = validator
            .validate_text(text, &CancellationToken::new())
            .await;

        assert_eq!(records[0].status, CitationStatus::Valid);
        let queries = mock.queries();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].starts_with("1. Smith, J."));
        assert_eq!(queries[1], "A Study of Things");
        assert_eq!(queries[2], "study things");
    }

    #[tokio::test]
    async fn empty_everywhere_is_not_found() {
        let mock = Arc::new(MockLookup::new("CrossRef", MockLookupResponse::Empty));
        let validator = validator_with(vec![mock]);

        let records = validator
            .validate_text(SMITH_DOE, &CancellationToken::new())
            .await;
        assert_eq!(records.len(), 2);
        assert!(
            records
                .iter()
                .all(|r| r.status == CitationStatus::NotFound)
        );
    }

    #[tokio::test]
    async fn timeout_maps_to_timeout_status() {
        let mock = Arc::new(MockLookup::new("CrossRef", MockLookupResponse::Timeout));
        let validator = validator_with(vec![mock]);

        let text = "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n";
        let records = validator
            .validate_text(text, &CancellationToken::new())
            .await;
        assert_eq!(records[0].status, CitationStatus::Timeout);
        assert!(records[0].doi.is_none());
    }

    #[tokio::test]
    async fn request_failure_maps_to_error_status() {
        let mock = Arc::new(MockLookup::new(
            "CrossRef",
            MockLookupResponse::Error("503".to_string()),
        ));
        let validator = validator_with(vec![mock]);

        let text = "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n";
        let records = validator
            .validate_text(text, &CancellationToken::new())
            .await;
        assert_eq!(records[0].status, CitationStatus::Error);
    }

    #[tokio::test]
    async fn second_backend_is_tried_when_first_is_empty() {
        let first = Arc::new(MockLookup::new("CrossRef", MockLookupResponse::Empty));
        let second = Arc::new(MockLookup::finding(
            "Semantic Scholar",
            "A Study of Things",
            None,
        ));
        let validator = validator_with(vec![first.clone(), second.clone()]);

        let text = "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n";
        let records = validator
            .validate_text(text, &CancellationToken::new())
            .await;

        assert_eq!(records[0].status, CitationStatus::Valid);
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
    }

    #[tokio::test]
    async fn unrelated_hit_leaves_matched_title_unset() {
        let mock = Arc::new(MockLookup::finding(
            "CrossRef",
            "Completely Different Topic Entirely",
            Some("10.1000/other"),
        ));
        let validator = validator_with(vec![mock]);

        let text = "References\n1. Smith, J. (2020). A Study of Things. Journal X.\n";
        let records = validator
            .validate_text(text, &CancellationToken::new())
            .await;

        assert_eq!(records[0].status, CitationStatus::Valid);
        assert!(records[0].matched_title.is_none());
        assert_eq!(records[0].doi.as_deref(), Some("10.1000/other"));
    }

    #[tokio::test]
    async fn records_preserve_document_order() {
        let mock = Arc::new(MockLookup::new("CrossRef", MockLookupResponse::Empty));
        let validator = validator_with(vec![mock]);

        let records = validator
            .validate_text(SMITH_DOE, &CancellationToken::new())
            .await;
        assert_eq!(records.len(), 2);
        assert!(records[0].raw_text.starts_with("1. Smith, J."));
        assert!(records[1].raw_text.starts_with("2. Doe, A."));
        assert_eq!(records[0].cleaned_title, "A Study of Things");
        assert!(records[1].cleaned_title.contains("Some Other Work"));
    }

    #[tokio::test]
    async fn no_references_section_skips_lookups() {
        let mock = Arc::new(MockLookup::new("CrossRef", MockLookupResponse::Empty));
        let validator = validator_with(vec![mock.clone()]);

        let records = validator
            .validate_text("An abstract with no bibliography at all.", &CancellationToken::new())
            .await;
        assert!(records.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_lookups_are_bounded() {
        use std::future::Future;
        use std::pin::Pin;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct GaugedLookup {
            in_flight: AtomicUsize,
            high_water: AtomicUsize,
        }

        impl LookupBackend for GaugedLookup {
            fn name(&self) -> &str {
                "Gauged"
            }

            fn search<'a>(
                &'a self,
                _query: &'a str,
                _client: &'a reqwest::Client,
                _timeout: Duration,
            ) -> Pin<Box<dyn Future<Output = Result<Vec<crate::lookup::BibMatch>, LookupError>> + Send + 'a>>
            {
                Box::pin(async move {
                    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    self.high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(vec![crate::lookup::BibMatch {
                        title: "A Study of Things".to_string(),
                        doi: None,
                        authors: vec![],
                    }])
                })
            }
        }

        let gauge = Arc::new(GaugedLookup {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        });
        let validator = CitationValidator::with_backends(
            vec![gauge.clone() as Arc<dyn LookupBackend>],
            reqwest::Client::new(),
            Duration::from_secs(1),
            50,
        );

        let mut text = String::from("References\n");
        for i in 1..=20 {
            text.push_str(&format!("{i}. Entry number {i} with enough text to keep.\n"));
        }
        let records = validator
            .validate_text(&text, &CancellationToken::new())
            .await;

        assert_eq!(records.len(), 20);
        assert!(
            gauge.high_water.load(Ordering::SeqCst) <= MAX_CONCURRENT_LOOKUPS,
            "saw {} concurrent lookups",
            gauge.high_water.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn cancelled_token_returns_early() {
        let mock = Arc::new(MockLookup::new("CrossRef", MockLookupResponse::Empty));
        let validator = validator_with(vec![mock]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let records = validator.validate_text(SMITH_DOE, &cancel).await;
        // Already-cancelled token means nothing is awaited to completion
        assert!(records.len() <= 2);
    }
}
