//! Bibliographic lookup backends used for citation validation.

pub mod crossref;
pub mod mock;
pub mod semantic_scholar;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::Config;

/// One bibliographic search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct BibMatch {
    pub title: String,
    pub doi: Option<String>,
    pub authors: Vec<String>,
}

#[derive(Error, Debug, Clone)]
pub enum LookupError {
    #[error("lookup timed out")]
    Timeout,
    #[error("lookup request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Request(e.to_string())
        }
    }
}

/// A bibliographic service that can search for works by free-text query.
/// Implementations return at most one page of results.
pub trait LookupBackend: Send + Sync {
    /// Canonical service name (e.g. "CrossRef").
    fn name(&self) -> &str;

    fn search<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<BibMatch>, LookupError>> + Send + 'a>>;
}

/// Build the lookup services in priority order, honoring `disabled_lookups`.
pub fn build_lookup_list(config: &Config) -> Vec<Arc<dyn LookupBackend>> {
    let enabled = |name: &str| {
        !config
            .disabled_lookups
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    };

    let mut backends: Vec<Arc<dyn LookupBackend>> = Vec::new();
    if enabled("CrossRef") {
        backends.push(Arc::new(crossref::CrossRef {
            mailto: config.crossref_mailto.clone(),
        }));
    }
    if enabled("Semantic Scholar") {
        backends.push(Arc::new(semantic_scholar::SemanticScholar {
            api_key: config.semantic_scholar_key.clone(),
        }));
    }
    backends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_crossref_first() {
        let backends = build_lookup_list(&Config::default());
        let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["CrossRef", "Semantic Scholar"]);
    }

    #[test]
    fn disabled_lookups_are_skipped() {
        let config = Config {
            disabled_lookups: vec!["crossref".to_string()],
            ..Default::default()
        };
        let names: Vec<String> = build_lookup_list(&config)
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["Semantic Scholar"]);
    }
}
