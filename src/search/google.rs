//! Google Programmable Search (Custom Search JSON API).

use crate::config::SearchConfig;
use crate::error::ServiceError;
use crate::results::SearchResult;
use crate::search::SearchProvider;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// The API never returns more than this many items per page.
pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

pub struct GoogleSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    max_results: usize,
}

impl GoogleSearch {
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &SearchConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            engine_id: config.engine_id.clone(),
            max_results: config.max_results.min(MAX_RESULTS),
        })
    }

    async fn query(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
            ],
        )
        .map_err(|e| ServiceError::Http(format!("invalid search endpoint: {e}")))?;

        // without_url keeps the API key out of error messages
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::from(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.without_url().to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .filter_map(|item| item.link)
            .filter(|link| !link.trim().is_empty())
            .take(self.max_results)
            .map(SearchResult::new)
            .collect())
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        ::log::debug!("Searching for {:?}", query);
        match self.query(query).await {
            Ok(results) => {
                ::log::info!("Search returned {} URLs", results.len());
                results
            }
            Err(e) => {
                ::log::error!("Search failed: {}", e);
                Vec::new()
            }
        }
    }
}
