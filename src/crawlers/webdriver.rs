use crate::crawlers::{FetchedDocument, PageFetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use tokio::sync::Mutex;

/// Common WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Fetches pages through WebDriver sessions, so JavaScript-rendered content
/// is visible. Sessions are connected lazily and reused across fetches.
pub struct WebDriverFetcher {
    webdriver_url: String,
    fallback_urls: Vec<String>,
    idle: Mutex<Vec<Client>>,
}

impl WebDriverFetcher {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            fallback_urls: FALLBACK_WEBDRIVER_URLS.iter().map(|s| s.to_string()).collect(),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Replace the fallback endpoint list
    pub fn with_fallbacks(mut self, fallback_urls: Vec<String>) -> Self {
        self.fallback_urls = fallback_urls;
        self
    }

    async fn checkout(&self) -> Result<Client, FetchError> {
        if let Some(client) = self.idle.lock().await.pop() {
            return Ok(client);
        }
        self.connect().await.ok_or_else(|| {
            FetchError::Transport(format!(
                "no WebDriver server reachable at {} or fallbacks",
                self.webdriver_url
            ))
        })
    }

    async fn checkin(&self, client: Client) {
        self.idle.lock().await.push(client);
    }

    /// Connects to the configured WebDriver, then to the fallbacks
    async fn connect(&self) -> Option<Client> {
        match ClientBuilder::native().connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Some(client);
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
            }
        }

        for url in &self.fallback_urls {
            if *url == self.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = ClientBuilder::native().connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Some(client);
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        None
    }
}

/// Navigates and reads back the rendered source
async fn navigate(client: &Client, url: &str) -> Result<FetchedDocument, fantoccini::error::CmdError> {
    client.goto(url).await?;
    let final_url = client.current_url().await?;
    let body = client.source().await?;
    Ok(FetchedDocument {
        url: final_url.to_string(),
        content_type: None,
        body,
    })
}

fn is_lost_session(error: &fantoccini::error::CmdError) -> bool {
    error.to_string().contains("Unable to find session")
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedDocument, FetchError> {
        let client = self.checkout().await?;

        match tokio::time::timeout(timeout, navigate(&client, url)).await {
            Ok(Ok(document)) => {
                self.checkin(client).await;
                Ok(document)
            }
            Ok(Err(e)) => {
                if is_lost_session(&e) {
                    ::log::warn!("Lost WebDriver session while accessing {}", url);
                } else {
                    self.checkin(client).await;
                }
                Err(FetchError::Transport(e.to_string()))
            }
            Err(_) => {
                // The session may still be mid-navigation, so it is not reused.
                tokio::spawn(async move {
                    if let Err(e) = client.close().await {
                        ::log::warn!("Failed to close timed out WebDriver session: {}", e);
                    }
                });
                Err(FetchError::Timeout(timeout))
            }
        }
    }

    /// Closes every idle session
    async fn shutdown(&self) {
        let clients: Vec<Client> = std::mem::take(&mut *self.idle.lock().await);
        if !clients.is_empty() {
            ::log::info!("Closing {} WebDriver sessions", clients.len());
        }
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_driver_is_transport_error() {
        let fetcher = WebDriverFetcher::new("http://127.0.0.1:1").with_fallbacks(vec![]);
        let err = fetcher
            .fetch("https://example.com/", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(err.to_string().contains("127.0.0.1:1"));
    }

    #[tokio::test]
    async fn shutdown_without_sessions_is_noop() {
        let fetcher = WebDriverFetcher::new("http://127.0.0.1:1").with_fallbacks(vec![]);
        fetcher.shutdown().await;
        assert!(fetcher.idle.lock().await.is_empty());
    }
}
