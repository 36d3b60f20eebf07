//! Plain HTTP transport built on a shared [`reqwest::Client`].

use crate::crawlers::{FetchedDocument, PageFetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Browser-like User-Agent used unless the configuration overrides it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Fetches pages with a single pooled HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with gzip/brotli decoding and a redirect limit of 10.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the client cannot be constructed.
    pub fn new(user_agent: Option<&str>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch_inner(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(FetchedDocument {
            url: final_url,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedDocument, FetchError> {
        match tokio::time::timeout(timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><title>Hi</title></html>",
                    "text/html; charset=utf-8",
                ),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None).unwrap();
        let doc = fetcher
            .fetch(&format!("{}/page", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(doc.url, format!("{}/page", server.uri()));
        assert_eq!(doc.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert!(doc.body.contains("<title>Hi</title>"));
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None).unwrap();
        let err = fetcher
            .fetch(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(None).unwrap();
        let err = fetcher
            .fetch(&server.uri(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "ResearchBot/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Some("ResearchBot/1.0")).unwrap();
        assert!(fetcher.fetch(&server.uri(), Duration::from_secs(5)).await.is_ok());
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let fetcher = HttpFetcher::new(None).unwrap();
        let err = fetcher
            .fetch("http://127.0.0.1:1/", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
