//! Time-bounded caches for the external services.
//!
//! [`CachedSearch`] and [`CachedModel`] wrap a [`SearchProvider`] or a
//! [`LanguageModel`] and answer repeated requests from a [`moka`] cache.

use crate::error::ServiceError;
use crate::llm::LanguageModel;
use crate::results::SearchResult;
use crate::search::SearchProvider;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// A TTL cache. Entries leave only by expiry; there is no size bound.
/// A zero TTL disables it: lookups always miss and inserts are dropped.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Option<Cache<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let inner = (!ttl.is_zero()).then(|| Cache::builder().time_to_live(ttl).build());
        Self { inner }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value).await;
        }
    }
}

/// Lowercased, trimmed query
fn search_key(query: &str) -> String {
    query.trim().to_lowercase()
}

fn prompt_key(prompt: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    hasher.finish()
}

pub struct CachedSearch<S> {
    inner: S,
    cache: TtlCache<String, Vec<SearchResult>>,
}

impl<S: SearchProvider> CachedSearch<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl<S: SearchProvider> SearchProvider for CachedSearch<S> {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let key = search_key(query);
        if let Some(hit) = self.cache.get(&key).await {
            ::log::debug!("Search cache hit for {:?}", key);
            return hit;
        }

        let results = self.inner.search(query).await;
        // an empty list may be a transient failure
        if !results.is_empty() {
            self.cache.insert(key, results.clone()).await;
        }
        results
    }
}

pub struct CachedModel<M> {
    inner: M,
    cache: TtlCache<u64, String>,
}

impl<M: LanguageModel> CachedModel<M> {
    pub fn new(inner: M, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for CachedModel<M> {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let key = prompt_key(prompt);
        if let Some(hit) = self.cache.get(&key).await {
            ::log::debug!("Language model cache hit");
            return Ok(hit);
        }

        let answer = self.inner.generate(prompt).await?;
        self.cache.insert(key, answer.clone()).await;
        Ok(answer)
    }
}
