//! Mock bibliographic lookup backend for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{BibMatch, LookupBackend, LookupError};

/// A configurable mock response for [`MockLookup`].
#[derive(Clone, Debug)]
pub enum MockLookupResponse {
    /// Return these hits.
    Found(Vec<BibMatch>),
    /// Return an empty page.
    Empty,
    /// Simulate a timeout.
    Timeout,
    /// Simulate a request failure.
    Error(String),
}

/// A hand-rolled mock implementing [`LookupBackend`] for tests.
///
/// Supports a fixed response or a per-call sequence (the last response
/// repeats when exhausted), plus call counting and recorded queries.
pub struct MockLookup {
    name: &'static str,
    responses: Mutex<Vec<MockLookupResponse>>,
    fallback: MockLookupResponse,
    queries: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockLookup {
    /// Create a mock that always returns `response`.
    pub fn new(name: &'static str, response: MockLookupResponse) -> Self {
        Self {
            name,
            responses: Mutex::new(Vec::new()),
            fallback: response,
            queries: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns responses in order, repeating the last.
    pub fn with_sequence(name: &'static str, mut responses: Vec<MockLookupResponse>) -> Self {
        assert!(!responses.is_empty(), "sequence must not be empty");
        responses.reverse();
        let fallback = responses.first().cloned().unwrap();
        Self {
            name,
            responses: Mutex::new(responses),
            fallback,
            queries: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Convenience: a mock that finds exactly one work.
    pub fn finding(name: &'static str, title: &str, doi: Option<&str>) -> Self {
        Self::new(
            name,
            MockLookupResponse::Found(vec![BibMatch {
                title: title.to_string(),
                doi: doi.map(str::to_string),
                authors: vec![],
            }]),
        )
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The queries this mock has received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockLookupResponse {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl LookupBackend for MockLookup {
    fn name(&self) -> &str {
        self.name
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<BibMatch>, LookupError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        let response = self.next_response();

        Box::pin(async move {
            match response {
                MockLookupResponse::Found(matches) => Ok(matches),
                MockLookupResponse::Empty => Ok(vec![]),
                MockLookupResponse::Timeout => Err(LookupError::Timeout),
                MockLookupResponse::Error(msg) => Err(LookupError::Request(msg)),
            }
        })
    }
}
