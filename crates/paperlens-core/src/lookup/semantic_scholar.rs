use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{BibMatch, LookupBackend, LookupError};

pub struct SemanticScholar {
    pub api_key: Option<String>,
}

impl LookupBackend for SemanticScholar {
    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<BibMatch>, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "https://api.semanticscholar.org/graph/v1/paper/search?query={}&limit=5&fields=title,externalIds,authors",
                urlencoding::encode(query)
            );

            let mut request = client.get(&url).timeout(timeout);
            if let Some(ref key) = self.api_key {
                request = request.header("x-api-key", key);
            }

            let resp = request.send().await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(LookupError::Request(format!("HTTP {status}")));
            }

            let data: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| LookupError::Request(e.to_string()))?;
            let items = data["data"].as_array().cloned().unwrap_or_default();

            let matches = items
                .iter()
                .filter_map(|item| {
                    let title = item["title"].as_str()?;
                    let authors = item["authors"]
                        .as_array()
                        .map(|arr| {
                            arr.iter()
                                .filter_map(|a| a["name"].as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();

                    Some(BibMatch {
                        title: title.to_string(),
                        doi: item["externalIds"]["DOI"].as_str().map(str::to_string),
                        authors,
                    })
                })
                .collect();

            Ok(matches)
        })
    }
}
