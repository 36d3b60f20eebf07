pub mod coordinator;
pub mod http;
pub mod visited;
pub mod webdriver;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use http::HttpFetcher;
pub use visited::VisitedSet;
pub use webdriver::WebDriverFetcher;

use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// A raw document as returned by a transport
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects
    pub url: String,
    /// `Content-Type` header, when the transport knows it
    pub content_type: Option<String>,
    pub body: String,
}

/// Transport that retrieves one page.
///
/// Implementations must give up once `timeout` has elapsed and report
/// [`FetchError::Timeout`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedDocument, FetchError>;

    /// Release any sessions or connections held by the transport
    async fn shutdown(&self) {}
}
