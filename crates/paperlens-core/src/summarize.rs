//! Summarization stage: a model-backed primary strategy with a
//! deterministic extractive fallback.
//!
//! The model capability is selected once at startup from configuration and
//! shared for the life of the process; it is never re-decided per call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::Config;
use crate::text::{count_words, split_sentences, truncate_words};

/// Characters per chunk sent to the model capability.
const CHUNK_CHARS: usize = 1100;

/// Word budget for the finished summary.
const TARGET_WORDS: usize = 200;

/// A concatenation longer than this gets one condensing pass.
const RESUMMARIZE_ABOVE_WORDS: usize = 250;

const TOO_SHORT_MESSAGE: &str = "Document too short to summarize effectively.";

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("summarization capability unavailable: {0}")]
    Unavailable(String),
    #[error("summarization model error: {0}")]
    Model(String),
}

/// Narrow contract for the model-based summarization capability.
pub trait SummaryBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize one input chunk into roughly `min_words..=max_words` words.
    fn summarize_chunk<'a>(
        &'a self,
        text: &'a str,
        max_words: usize,
        min_words: usize,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>>;
}

/// HF-style inference endpoint backend.
pub struct RemoteSummaryBackend {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteSummaryBackend {
    pub fn new(
        endpoint: String,
        token: Option<String>,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            token,
            client,
            timeout,
        }
    }
}

impl SummaryBackend for RemoteSummaryBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn summarize_chunk<'a>(
        &'a self,
        text: &'a str,
        max_words: usize,
        min_words: usize,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>> {
        Box::pin(async move {
            let body = serde_json::json!({
                "inputs": text,
                "parameters": { "max_length": max_words, "min_length": min_words, "do_sample": false },
            });

            let mut request = self
                .client
                .post(&self.endpoint)
                .json(&body)
                .timeout(self.timeout);
            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| SummaryError::Unavailable(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(SummaryError::Model(format!("HTTP {status}")));
            }

            let data: serde_json::Value =
                resp.json().await.map_err(|e| SummaryError::Model(e.to_string()))?;
            let summary = data
                .get(0)
                .and_then(|v| v["summary_text"].as_str())
                .ok_or_else(|| SummaryError::Model("missing summary_text in response".into()))?;

            Ok(summary.trim().to_string())
        })
    }
}

/// The summarization stage. Tries the model capability when one is
/// configured, falling back to extractive scoring on any model failure.
#[derive(Clone)]
pub struct Summarizer {
    backend: Option<Arc<dyn SummaryBackend>>,
    /// When set, a backend failure is an error instead of a fallback.
    /// Used by callers that want model-or-nothing semantics.
    strict: bool,
    min_text_chars: usize,
}

impl Summarizer {
    pub fn new(config: &Config, client: &reqwest::Client) -> Self {
        let backend: Option<Arc<dyn SummaryBackend>> = match (
            config.use_remote_summarizer,
            config.summarizer_endpoint.clone(),
        ) {
            (true, Some(endpoint)) => Some(Arc::new(RemoteSummaryBackend::new(
                endpoint,
                config.hf_api_token.clone(),
                client.clone(),
                Duration::from_secs(config.lookup_timeout_secs),
            ))),
            _ => None,
        };

        Self {
            backend,
            strict: false,
            min_text_chars: config.min_text_chars,
        }
    }

    /// Heuristic-only summarizer with no model capability.
    pub fn heuristic_only() -> Self {
        Self {
            backend: None,
            strict: false,
            min_text_chars: 100,
        }
    }

    /// Use the given backend with heuristic fallback on failure.
    pub fn with_backend(backend: Arc<dyn SummaryBackend>) -> Self {
        Self {
            backend: Some(backend),
            strict: false,
            min_text_chars: 100,
        }
    }

    /// Use the given backend with no fallback: backend errors propagate.
    pub fn strict(backend: Arc<dyn SummaryBackend>) -> Self {
        Self {
            backend: Some(backend),
            strict: true,
            min_text_chars: 100,
        }
    }

    /// Produce a summary. Non-empty for any text at or over the minimum
    /// length; shorter input gets the fixed too-short message.
    pub async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let trimmed = text.trim();
        if trimmed.len() < self.min_text_chars {
            return Ok(TOO_SHORT_MESSAGE.to_string());
        }

        if let Some(ref backend) = self.backend {
            match self.summarize_with_model(backend.as_ref(), trimmed).await {
                Ok(summary) if !summary.is_empty() => return Ok(summary),
                Ok(_) => {
                    tracing::warn!(backend = backend.name(), "model returned empty summary");
                }
                Err(e) if self.strict => return Err(e),
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "model summarization failed, using heuristic");
                }
            }
        }

        Ok(summarize_heuristic(trimmed))
    }

    async fn summarize_with_model(
        &self,
        backend: &dyn SummaryBackend,
        text: &str,
    ) -> Result<String, SummaryError> {
        let mut parts = Vec::new();
        for chunk in chunk_text(text, CHUNK_CHARS) {
            let part = backend.summarize_chunk(&chunk, 120, 40).await?;
            if !part.is_empty() {
                parts.push(part);
            }
        }

        let mut combined = parts.join(" ");
        if count_words(&combined) > RESUMMARIZE_ABOVE_WORDS {
            // One condensing pass over the concatenation; hard truncation
            // is the last resort.
            let input = trim_to_sentence(&combined, CHUNK_CHARS);
            match backend.summarize_chunk(&input, TARGET_WORDS, 80).await {
                Ok(condensed) if !condensed.is_empty() => combined = condensed,
                _ => combined = truncate_words(&combined, TARGET_WORDS),
            }
            if count_words(&combined) > RESUMMARIZE_ABOVE_WORDS {
                combined = truncate_words(&combined, TARGET_WORDS);
            }
        }

        Ok(combined.trim().to_string())
    }
}

/// Split on paragraph boundaries, packing paragraphs into chunks of at most
/// `max_chars`. Oversized paragraphs are cut at the nearest preceding
/// sentence terminator so no chunk ends mid-sentence.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if !current.is_empty() && current.len() + paragraph.len() + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }

        if paragraph.len() > max_chars {
            let mut rest = paragraph;
            while rest.len() > max_chars {
                let piece = trim_to_sentence(rest, max_chars);
                let cut = piece.len().max(1);
                chunks.push(piece);
                rest = rest[cut.min(rest.len())..].trim_start();
            }
            if !rest.is_empty() {
                current = rest.to_string();
            }
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(paragraph);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Take up to `max_chars`, preferring to end at the last sentence
/// terminator in the back 30% of the window.
fn trim_to_sentence(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut cut = max_chars;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let window = &text[..cut];
    if let Some(pos) = window.rfind(['.', '!', '?']) {
        if pos > max_chars * 7 / 10 {
            return window[..=pos].to_string();
        }
    }
    window.to_string()
}

static IMPORTANT_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "study",
        "result",
        "method",
        "conclude",
        "finding",
        "research",
        "analysis",
        "experiment",
        "data",
        "significant",
        "demonstrate",
        "propose",
        "novel",
        "approach",
        "framework",
        "model",
        "algorithm",
    ]
});

/// Extractive fallback: score sentences, pick the best within a ~200-word
/// budget (3 to 7 sentences), then restore original document order.
pub fn summarize_heuristic(text: &str) -> String {
    let sentences = split_sentences(text);
    let total = sentences.len();

    let mut scored: Vec<(usize, i32)> = Vec::new();
    for (index, sentence) in sentences.iter().enumerate() {
        let words = count_words(sentence);
        if words < 5 {
            continue;
        }

        let mut score = 0;
        if (15..=30).contains(&words) {
            score += 2;
        } else if (10..=40).contains(&words) {
            score += 1;
        }

        let lower = sentence.to_lowercase();
        for keyword in IMPORTANT_KEYWORDS.iter() {
            if lower.contains(keyword) {
                score += 1;
            }
        }

        if index < total / 5 || index >= total - total / 5 {
            score += 1;
        }

        scored.push((index, score));
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut selected: Vec<usize> = Vec::new();
    let mut budget = 0;
    for &(index, _) in &scored {
        let words = count_words(&sentences[index]);
        if budget + words <= TARGET_WORDS {
            selected.push(index);
            budget += words;
        }
        if selected.len() >= 7 || budget >= TARGET_WORDS * 9 / 10 {
            break;
        }
    }

    // Top up to the minimum regardless of budget
    if selected.len() < 3 {
        for &(index, _) in &scored {
            if !selected.contains(&index) {
                selected.push(index);
                if selected.len() >= 3 {
                    break;
                }
            }
        }
    }

    selected.sort_unstable();
    let summary = selected
        .iter()
        .map(|&i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(". ");

    if summary.is_empty() {
        // Degenerate input with no scorable sentences
        return truncate_words(text.trim(), TARGET_WORDS);
    }
    format!("{summary}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning canned responses, counting calls.
    pub(crate) struct MockSummaryBackend {
        responses: Mutex<Vec<Result<String, String>>>,
        calls: AtomicUsize,
    }

    impl MockSummaryBackend {
        pub(crate) fn new(responses: Vec<Result<String, String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self::new(vec![])
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SummaryBackend for MockSummaryBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn summarize_chunk<'a>(
            &'a self,
            _text: &'a str,
            _max_words: usize,
            _min_words: usize,
        ) -> Pin<Box<dyn Future<Output = Result<String, SummaryError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop();
            Box::pin(async move {
                match next {
                    Some(Ok(s)) => Ok(s),
                    Some(Err(e)) => Err(SummaryError::Model(e)),
                    None => Err(SummaryError::Unavailable("no response configured".into())),
                }
            })
        }
    }

    fn long_text() -> String {
        let mut text = String::new();
        text.push_str("This study examines failure recovery in distributed storage systems. ");
        text.push_str("We propose a novel replication method that tolerates correlated faults. ");
        for i in 0..30 {
            text.push_str(&format!(
                "Paragraph body sentence number {i} describes the experiment setup in detail with enough words to matter. "
            ));
        }
        text.push_str("The results demonstrate a significant reduction in recovery time. ");
        text.push_str("We conclude that the proposed framework generalizes to other systems.");
        text
    }

    #[tokio::test]
    async fn short_text_gets_fixed_message() {
        let summarizer = Summarizer::heuristic_only();
        let out = summarizer.summarize("tiny input").await.unwrap();
        assert_eq!(out, TOO_SHORT_MESSAGE);
    }

    #[tokio::test]
    async fn heuristic_is_nonempty_and_bounded() {
        let summarizer = Summarizer::heuristic_only();
        let out = summarizer.summarize(&long_text()).await.unwrap();
        assert!(!out.is_empty());
        assert!(count_words(&out) <= 210, "got {} words", count_words(&out));
    }

    #[tokio::test]
    async fn heuristic_preserves_document_order() {
        let summarizer = Summarizer::heuristic_only();
        let out = summarizer.summarize(&long_text()).await.unwrap();
        let study = out.find("study examines failure recovery");
        let conclude = out.find("conclude that the proposed framework");
        if let (Some(a), Some(b)) = (study, conclude) {
            assert!(a < b);
        }
    }

    #[tokio::test]
    async fn model_output_used_when_backend_succeeds() {
        let backend = Arc::new(MockSummaryBackend::new(vec![Ok(
            "A concise model summary.".to_string()
        )]));
        let summarizer = Summarizer::with_backend(backend.clone());
        let text = "word ".repeat(60);
        let out = summarizer.summarize(&text).await.unwrap();
        assert_eq!(out, "A concise model summary.");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_heuristic() {
        let backend = Arc::new(MockSummaryBackend::failing());
        let summarizer = Summarizer::with_backend(backend);
        let out = summarizer.summarize(&long_text()).await.unwrap();
        assert!(!out.is_empty());
        assert_ne!(out, TOO_SHORT_MESSAGE);
    }

    #[tokio::test]
    async fn strict_mode_propagates_backend_errors() {
        let backend = Arc::new(MockSummaryBackend::failing());
        let summarizer = Summarizer::strict(backend);
        assert!(summarizer.summarize(&long_text()).await.is_err());
    }

    #[tokio::test]
    async fn long_concatenation_gets_condensed() {
        // Three chunks worth of text, each chunk reply is 100 words, so the
        // concatenation exceeds 250 words and triggers the condensing pass.
        let chunk_reply = "reply ".repeat(100).trim().to_string();
        let backend = Arc::new(MockSummaryBackend::new(vec![
            Ok(chunk_reply.clone()),
            Ok(chunk_reply.clone()),
            Ok(chunk_reply.clone()),
            Ok("Condensed final summary.".to_string()),
        ]));
        let summarizer = Summarizer::with_backend(backend.clone());

        let paragraph = "sentence content here. ".repeat(40);
        let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
        let out = summarizer.summarize(&text).await.unwrap();
        assert_eq!(out, "Condensed final summary.");
        assert_eq!(backend.calls(), 4);
    }

    #[test]
    fn chunks_respect_size_and_sentence_boundaries() {
        let paragraph = "one two three four five six seven eight nine ten. ".repeat(50);
        let chunks = chunk_text(&paragraph, CHUNK_CHARS);
        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.len() <= CHUNK_CHARS);
            assert!(chunk.trim_end().ends_with('.'), "chunk ends mid-sentence");
        }
    }

    #[test]
    fn trim_to_sentence_prefers_terminator() {
        let text = format!("{} End.", "a".repeat(900));
        let out = trim_to_sentence(&format!("{text}{}", "b".repeat(400)), 1000);
        assert!(out.ends_with("End."));
    }
}
