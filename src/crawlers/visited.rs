use crate::filter::normalize_url;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// URLs already claimed for fetching, shared by every fetch task of one request.
///
/// Keys are normalised with [`normalize_url`], so `https://a.com` and
/// `https://a.com/#top` are the same entry.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks and marks `url` as visited.
    ///
    /// Returns `true` only for the first caller; every later claim of the
    /// same URL returns `false`.
    pub async fn claim(&self, url: &str) -> bool {
        let key = normalize_url(url);
        let mut seen = self.inner.lock().await;
        seen.insert(key)
    }

    pub async fn contains(&self, url: &str) -> bool {
        let key = normalize_url(url);
        self.inner.lock().await.contains(&key)
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
