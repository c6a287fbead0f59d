//! Mock fact-check backend for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use super::{FactCheckBackend, FactCheckError};
use crate::FactCheckReview;

/// A configurable mock response for [`MockFactCheck`].
#[derive(Clone, Debug)]
pub enum MockFactCheckResponse {
    /// Return these reviews.
    Found(Vec<FactCheckReview>),
    /// Simulate a timeout.
    Timeout,
    /// Simulate a request failure.
    Error(String),
}

/// A hand-rolled mock implementing [`FactCheckBackend`] for tests.
///
/// Supports a fixed response or a per-call sequence (the last response
/// repeats when exhausted). Records call count, received queries, and the
/// tokio clock at each call for timing assertions.
pub struct MockFactCheck {
    responses: Mutex<Vec<MockFactCheckResponse>>,
    fallback: MockFactCheckResponse,
    queries: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
    call_count: AtomicUsize,
}

impl MockFactCheck {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockFactCheckResponse) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            queries: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns responses in order, repeating the last.
    pub fn with_sequence(mut responses: Vec<MockFactCheckResponse>) -> Self {
        assert!(!responses.is_empty(), "sequence must not be empty");
        responses.reverse();
        let fallback = responses.first().cloned().unwrap();
        Self {
            responses: Mutex::new(responses),
            fallback,
            queries: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The queries this mock has received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Tokio-clock timestamps of each call, for backoff assertions.
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockFactCheckResponse {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl FactCheckBackend for MockFactCheck {
    fn name(&self) -> &str {
        "Mock"
    }

    fn check<'a>(
        &'a self,
        query: &'a str,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FactCheckReview>, FactCheckError>> + Send + 'a>>
    {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        self.call_times.lock().unwrap().push(Instant::now());
        let response = self.next_response();

        Box::pin(async move {
            match response {
                MockFactCheckResponse::Found(reviews) => Ok(reviews),
                MockFactCheckResponse::Timeout => Err(FactCheckError::Timeout),
                MockFactCheckResponse::Error(msg) => Err(FactCheckError::Request(msg)),
            }
        })
    }
}
