use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{FactCheckBackend, FactCheckError};
use crate::FactCheckReview;

/// Queries longer than this are truncated before being sent.
const MAX_QUERY_CHARS: usize = 500;

/// Google Fact Check Tools claim search (REST, API key).
pub struct GoogleFactCheck {
    pub api_key: String,
}

impl FactCheckBackend for GoogleFactCheck {
    fn name(&self) -> &str {
        "Google Fact Check Tools"
    }

    fn check<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FactCheckReview>, FactCheckError>> + Send + 'a>>
    {
        Box::pin(async move {
            let query: String = query.chars().take(MAX_QUERY_CHARS).collect();
            let url = format!(
                "https://factchecktools.googleapis.com/v1alpha1/claims:search?query={}&key={}",
                urlencoding::encode(&query),
                urlencoding::encode(&self.api_key)
            );

            let resp = client.get(&url).timeout(timeout).send().await?;

            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(FactCheckError::Unauthorized);
            }
            if !status.is_success() {
                return Err(FactCheckError::Request(format!("HTTP {status}")));
            }

            let data: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| FactCheckError::Request(e.to_string()))?;
            let claims = data["claims"].as_array().cloned().unwrap_or_default();

            let reviews = claims
                .iter()
                .flat_map(|claim| {
                    claim["claimReview"]
                        .as_array()
                        .cloned()
                        .unwrap_or_default()
                })
                .map(|review| FactCheckReview {
                    publisher: review["publisher"]["name"].as_str().unwrap_or("").to_string(),
                    url: review["url"].as_str().map(str::to_string),
                    rating: review["textualRating"].as_str().unwrap_or("").to_string(),
                    title: review["title"].as_str().map(str::to_string),
                })
                .collect();

            Ok(reviews)
        })
    }
}
