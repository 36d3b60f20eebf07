pub mod cache;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod graph;
pub mod llm;
pub mod orchestrator;
pub mod parsers;
pub mod rank;
pub mod results;
pub mod search;
pub mod server;

// Re-export commonly used types for convenience
pub use config::{ResearchConfig, Transport};
pub use error::{ResearchError, Result};
pub use orchestrator::Synthesizer;
pub use results::{Analysis, CentralPage, PageRecord};

use cache::{CachedModel, CachedSearch};
use crawlers::{Coordinator, CoordinatorConfig, HttpFetcher, PageFetcher, WebDriverFetcher};
use filter::LinkFilter;
use llm::GeminiClient;
use search::GoogleSearch;
use std::sync::Arc;
use std::time::Duration;

/// Builder that wires configuration into a ready [`Synthesizer`]
pub struct Research {
    config: ResearchConfig,
}

impl Default for Research {
    fn default() -> Self {
        Self::new()
    }
}

impl Research {
    /// Start from default configuration
    pub fn new() -> Self {
        Self {
            config: ResearchConfig::default(),
        }
    }

    pub fn from_config(config: ResearchConfig) -> Self {
        Self { config }
    }

    /// Replace the configuration with one loaded from a JSON file
    pub fn with_config_file(mut self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        self.config = ResearchConfig::from_file(path)?;
        Ok(self)
    }

    /// Pick up API keys and the WebDriver URL from the environment
    pub fn with_env(mut self) -> Self {
        self.config.apply_env_overrides();
        self
    }

    /// Set the maximum number of concurrent fetches
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.fetch.max_concurrency = max_concurrency;
        self
    }

    /// Set the per-page fetch timeout
    pub fn with_fetch_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.fetch.timeout_secs = timeout_seconds;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.config.fetch.transport = transport;
        self
    }

    /// Follow same-site links this many levels past the search results
    pub fn with_expand_depth(mut self, depth: usize) -> Self {
        self.config.fetch.expand_depth = depth;
        self
    }

    /// Set the address `serve` listens on
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.config.server.bind = bind.into();
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Validate the configuration and construct every collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`] for invalid settings, missing
    /// credentials, or a client that cannot be constructed.
    pub fn build(self) -> Result<Synthesizer> {
        let config = self.config;
        config.validate()?;
        config.require_credentials()?;

        let fetcher: Arc<dyn PageFetcher> = match config.fetch.transport {
            Transport::Http => Arc::new(
                HttpFetcher::new(config.fetch.user_agent.as_deref())
                    .map_err(|e| ResearchError::Config(e.to_string()))?,
            ),
            Transport::WebDriver => {
                ::log::info!("Fetching pages through WebDriver at {}", config.fetch.webdriver_url);
                Arc::new(WebDriverFetcher::new(config.fetch.webdriver_url.clone()))
            }
        };

        let filter = LinkFilter::new(&config.fetch.exclude_patterns)
            .map_err(|e| ResearchError::Config(format!("invalid exclude pattern: {e}")))?;
        let coordinator = Coordinator::new(
            fetcher,
            Arc::new(filter),
            CoordinatorConfig::from(&config.fetch),
        );

        let search = GoogleSearch::new(&config.search)
            .map_err(|e| ResearchError::Config(e.to_string()))?;
        let search = CachedSearch::new(search, Duration::from_secs(config.search.cache_ttl_secs));

        let model =
            GeminiClient::new(&config.llm).map_err(|e| ResearchError::Config(e.to_string()))?;
        let model = CachedModel::new(model, Duration::from_secs(config.llm.cache_ttl_secs));

        Ok(Synthesizer::new(
            Arc::new(search),
            Arc::new(model),
            coordinator,
            config.ranking,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> ResearchConfig {
        let mut config = ResearchConfig::default();
        config.search.api_key = "key".into();
        config.search.engine_id = "cx".into();
        config.llm.api_key = "llm".into();
        config
    }

    #[test]
    fn builder_overrides_fetch_settings() {
        let research = Research::from_config(with_credentials())
            .with_max_concurrency(9)
            .with_fetch_timeout(3)
            .with_transport(Transport::WebDriver)
            .with_expand_depth(2);

        let fetch = &research.config().fetch;
        assert_eq!(fetch.max_concurrency, 9);
        assert_eq!(fetch.timeout_secs, 3);
        assert_eq!(fetch.transport, Transport::WebDriver);
        assert_eq!(fetch.expand_depth, 2);
    }

    #[test]
    fn config_file_then_builder_overrides() {
        let path = std::env::temp_dir().join(format!(
            "research-page-builder-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"fetch": {"max_concurrency": 2, "timeout_secs": 7}, "server": {"bind": "127.0.0.1:9000"}}"#,
        )
        .unwrap();

        let research = Research::new()
            .with_config_file(&path)
            .unwrap()
            .with_max_concurrency(4)
            .with_bind("0.0.0.0:8080");
        std::fs::remove_file(&path).unwrap();

        let config = research.config();
        assert_eq!(config.fetch.max_concurrency, 4);
        assert_eq!(config.fetch.timeout_secs, 7);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn build_requires_credentials() {
        let err = Research::new().build().err().unwrap();
        assert!(matches!(err, ResearchError::Config(_)));
    }

    #[test]
    fn build_rejects_zero_concurrency() {
        let err = Research::from_config(with_credentials())
            .with_max_concurrency(0)
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("max_concurrency"));
    }

    #[test]
    fn build_with_valid_config() {
        let synth = Research::from_config(with_credentials()).build().unwrap();
        assert_eq!(synth.ranking().top_chunks, 5);
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = Research::new()
            .with_config_file("/nonexistent/research.json")
            .err()
            .unwrap();
        assert!(matches!(err, ResearchError::Config(_)));
    }
}
