//! Web search providers.

pub mod google;

pub use google::GoogleSearch;

use crate::results::SearchResult;
use async_trait::async_trait;

/// Turns a question into a short list of candidate URLs.
///
/// Implementations never fail: transport or decoding problems are logged and
/// reported as an empty list, which the caller treats as "no results".
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}
