use crate::error::ResearchError;
use crate::rank::SentenceSplitter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for the search provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Google API key
    #[serde(default)]
    pub api_key: String,

    /// Programmable search engine id (`cx`)
    #[serde(default)]
    pub engine_id: String,

    /// Custom Search JSON API endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Number of URLs taken from the result list
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// HTTP timeout for the search call
    #[serde(default = "default_service_timeout_secs")]
    pub timeout_secs: u64,

    /// How long search results stay cached. 0 disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

/// Configuration for the language model service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// How long generated answers stay cached. 0 disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

/// Which transport fetches pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Plain HTTP requests
    #[default]
    Http,
    /// A WebDriver session (renders JavaScript)
    WebDriver,
}

/// Configuration for the fetch-extract stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of concurrent requests
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-page timeout
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub transport: Transport,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Custom User-Agent for the HTTP transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// How many levels of same-site links to follow beyond the search results
    #[serde(default)]
    pub expand_depth: usize,

    /// Upper bound on pages fetched when following links
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Regex patterns for outbound links to drop
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

/// Configuration for chunking and ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunks handed to the language model
    #[serde(default = "default_top_k")]
    pub top_chunks: usize,

    /// Central pages returned with the answer
    #[serde(default = "default_top_k")]
    pub top_pages: usize,

    #[serde(default = "default_damping")]
    pub damping: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default)]
    pub sentence_splitter: SentenceSplitter,
}

/// Configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_service_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_llm_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_max_concurrency() -> usize {
    5
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_pages() -> usize {
    25
}

/// Auth-related paths are never worth following
fn default_exclude_patterns() -> Vec<String> {
    vec![r"(?i)/(login|signup|register|forgot|password)".to_string()]
}

fn default_chunk_size() -> usize {
    1000
}

fn default_top_k() -> usize {
    5
}

fn default_damping() -> f64 {
    0.85
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1.0e-6
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            engine_id: String::new(),
            endpoint: default_search_endpoint(),
            max_results: default_max_results(),
            timeout_secs: default_service_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_llm_model(),
            endpoint: default_llm_endpoint(),
            timeout_secs: default_llm_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_fetch_timeout_secs(),
            transport: Transport::default(),
            webdriver_url: default_webdriver_url(),
            user_agent: None,
            expand_depth: 0,
            max_pages: default_max_pages(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            top_chunks: default_top_k(),
            top_pages: default_top_k(),
            damping: default_damping(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            sentence_splitter: SentenceSplitter::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ResearchConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResearchError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| ResearchError::Config(format!("cannot open {}: {e}", path.display())))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ResearchError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ResearchError> {
        serde_json::from_str(json).map_err(|e| ResearchError::Config(format!("invalid JSON: {e}")))
    }

    /// Override secrets and the WebDriver URL from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with a custom lookup.
    /// Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = get("GOOGLE_API_KEY") {
            self.search.api_key = key;
        }
        if let Some(cx) = get("SEARCH_ENGINE_ID") {
            self.search.engine_id = cx;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(url) = get("WEBDRIVER_URL") {
            self.fetch.webdriver_url = url;
        }
    }

    /// Checks numeric bounds and patterns. Credentials are checked separately
    /// by [`require_credentials`](Self::require_credentials).
    pub fn validate(&self) -> Result<(), ResearchError> {
        if self.fetch.max_concurrency == 0 {
            return Err(ResearchError::Config(
                "fetch.max_concurrency must be greater than 0".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ResearchError::Config(
                "fetch.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.search.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(ResearchError::Config(
                "service timeout_secs must be greater than 0".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ResearchError::Config(
                "search.max_results must be greater than 0".into(),
            ));
        }
        if self.ranking.chunk_size == 0 {
            return Err(ResearchError::Config(
                "ranking.chunk_size must be greater than 0".into(),
            ));
        }
        if self.ranking.top_chunks == 0 || self.ranking.top_pages == 0 {
            return Err(ResearchError::Config(
                "ranking top-k values must be greater than 0".into(),
            ));
        }
        if !(self.ranking.damping > 0.0 && self.ranking.damping < 1.0) {
            return Err(ResearchError::Config(
                "ranking.damping must be between 0 and 1".into(),
            ));
        }
        for pattern in &self.fetch.exclude_patterns {
            Regex::new(pattern).map_err(|e| {
                ResearchError::Config(format!("invalid exclude pattern {pattern:?}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Fails when an API key or engine id is missing.
    pub fn require_credentials(&self) -> Result<(), ResearchError> {
        if self.search.api_key.is_empty() || self.search.engine_id.is_empty() {
            return Err(ResearchError::Config(
                "GOOGLE_API_KEY and SEARCH_ENGINE_ID must be set".into(),
            ));
        }
        if self.llm.api_key.is_empty() {
            return Err(ResearchError::Config("GEMINI_API_KEY must be set".into()));
        }
        Ok(())
    }
}
