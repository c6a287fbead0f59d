use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{BibMatch, LookupBackend, LookupError};

pub struct CrossRef {
    pub mailto: Option<String>,
}

impl LookupBackend for CrossRef {
    fn name(&self) -> &str {
        "CrossRef"
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<BibMatch>, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            let mut url = format!(
                "https://api.crossref.org/works?query={}&rows=5&select=title,DOI,author",
                urlencoding::encode(query)
            );

            let user_agent = if let Some(ref email) = self.mailto {
                url.push_str(&format!("&mailto={}", urlencoding::encode(email)));
                format!("paperlens/0.1 (mailto:{email})")
            } else {
                "paperlens/0.1".to_string()
            };

            let resp = client
                .get(&url)
                .header("User-Agent", user_agent)
                .timeout(timeout)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(LookupError::Request(format!("HTTP {status}")));
            }

            let data: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| LookupError::Request(e.to_string()))?;
            let items = data["message"]["items"].as_array().cloned().unwrap_or_default();

            let matches = items
                .iter()
                .filter_map(|item| {
                    let title = item["title"]
                        .as_array()
                        .and_then(|a| a.first())
                        .and_then(|v| v.as_str())?;

                    let authors = item["author"]
                        .as_array()
                        .map(|arr| {
                            arr.iter()
                                .map(|a| {
                                    let given = a["given"].as_str().unwrap_or("");
                                    let family = a["family"].as_str().unwrap_or("");
                                    format!("{given} {family}").trim().to_string()
                                })
                                .filter(|name| !name.is_empty())
                                .collect()
                        })
                        .unwrap_or_default();

                    Some(BibMatch {
                        title: title.to_string(),
                        doi: item["DOI"].as_str().map(str::to_string),
                        authors,
                    })
                })
                .collect();

            Ok(matches)
        })
    }
}
