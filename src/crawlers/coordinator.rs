use crate::config::FetchConfig;
use crate::crawlers::{PageFetcher, VisitedSet};
use crate::error::FetchError;
use crate::filter::LinkFilter;
use crate::parsers::{Parser, ParserType};
use crate::results::PageRecord;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Limits for one coordinator run
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum number of fetches in flight at once
    pub max_concurrency: usize,
    /// Per-fetch timeout
    pub fetch_timeout: Duration,
    /// Levels of outbound links to follow after the initial batch
    pub expand_depth: usize,
    /// Upper bound on records once link expansion kicks in
    pub max_pages: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            fetch_timeout: Duration::from_secs(10),
            expand_depth: 0,
            max_pages: 25,
        }
    }
}

impl From<&FetchConfig> for CoordinatorConfig {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            fetch_timeout: config.timeout(),
            expand_depth: config.expand_depth,
            max_pages: config.max_pages,
        }
    }
}

/// Fetches pages concurrently, deduplicates by URL and extracts [`PageRecord`]s.
pub struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
    filter: Arc<LinkFilter>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        filter: Arc<LinkFilter>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            fetcher,
            filter,
            config,
        }
    }

    /// Releases transport resources such as WebDriver sessions
    pub async fn shutdown(&self) {
        self.fetcher.shutdown().await;
    }

    /// Fetches `urls` (and, with `expand_depth > 0`, their same-site links)
    /// using a visited set scoped to this call.
    ///
    /// Failed URLs are logged and left out. Each distinct URL yields at most
    /// one record. Dropping the returned future aborts every in-flight fetch.
    pub async fn run(&self, urls: Vec<String>) -> Vec<PageRecord> {
        let visited = VisitedSet::new();
        self.run_with_visited(urls, &visited).await
    }

    /// Same as [`run`](Self::run) but claims URLs in a caller-supplied set.
    pub async fn run_with_visited(&self, urls: Vec<String>, visited: &VisitedSet) -> Vec<PageRecord> {
        let started = Instant::now();
        let mut records: Vec<PageRecord> = Vec::new();
        let mut frontier = urls;
        let mut depth = 0;

        loop {
            let requested = frontier.len();
            let batch = self.fetch_batch(frontier, visited).await;
            ::log::info!(
                "Depth {}: extracted {} of {} requested pages",
                depth,
                batch.len(),
                requested
            );

            let batch_start = records.len();
            records.extend(batch);

            if depth >= self.config.expand_depth {
                break;
            }

            let remaining = self.config.max_pages.saturating_sub(records.len());
            if remaining == 0 {
                ::log::debug!("Page limit of {} reached", self.config.max_pages);
                break;
            }

            frontier = next_frontier(&records[batch_start..], visited, remaining).await;
            if frontier.is_empty() {
                break;
            }
            depth += 1;
        }

        ::log::info!(
            "Fetch stage complete - {} pages in {:.2} seconds",
            records.len(),
            started.elapsed().as_secs_f64()
        );
        records
    }

    /// Fans out one task per URL, bounded by the semaphore, and joins them all.
    /// Records come back in input order.
    async fn fetch_batch(&self, urls: Vec<String>, visited: &VisitedSet) -> Vec<PageRecord> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let filter = Arc::clone(&self.filter);
            let semaphore = Arc::clone(&semaphore);
            let visited = visited.clone();
            let fetch_timeout = self.config.fetch_timeout;

            tasks.spawn(async move {
                if !visited.claim(&url).await {
                    ::log::trace!("Skipping already visited: {}", url);
                    return None;
                }

                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };

                fetch_and_extract(fetcher.as_ref(), &filter, &url, fetch_timeout)
                    .await
                    .map(|record| (index, record))
            });
        }

        let mut fetched = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(pair)) => fetched.push(pair),
                Ok(None) => {}
                Err(e) => ::log::error!("Fetch task ended abnormally: {}", e),
            }
        }

        fetched.sort_by_key(|(index, _)| *index);
        fetched.into_iter().map(|(_, record)| record).collect()
    }
}

/// Outbound links of `records` that nobody has claimed yet, in discovery
/// order, capped at `limit`
async fn next_frontier(records: &[PageRecord], visited: &VisitedSet, limit: usize) -> Vec<String> {
    let mut frontier: Vec<String> = Vec::new();
    for link in records.iter().flat_map(|r| r.outbound_links.iter()) {
        if frontier.len() >= limit {
            break;
        }
        if visited.contains(link).await || frontier.contains(link) {
            continue;
        }
        ::log::debug!("Queuing link for fetching: {}", link);
        frontier.push(link.clone());
    }
    frontier
}

/// Fetches a single URL and turns it into a record. Every failure is logged
/// here and reported as `None`.
async fn fetch_and_extract(
    fetcher: &dyn PageFetcher,
    filter: &LinkFilter,
    url: &str,
    fetch_timeout: Duration,
) -> Option<PageRecord> {
    ::log::debug!("Fetching: {}", url);
    let started = Instant::now();

    let document = match tokio::time::timeout(fetch_timeout, fetcher.fetch(url, fetch_timeout)).await {
        Ok(Ok(document)) => document,
        Ok(Err(e @ (FetchError::Timeout(_) | FetchError::Status(_)))) => {
            ::log::warn!("Failed to retrieve {}: {}", url, e);
            return None;
        }
        Ok(Err(e)) => {
            ::log::error!("An error occurred while fetching {}: {}", url, e);
            return None;
        }
        Err(_) => {
            ::log::warn!("Timeout fetching {} after {:?}", url, fetch_timeout);
            return None;
        }
    };

    let parser_type = ParserType::detect(document.content_type.as_deref(), &document.url);
    let Some(parsed) = Parser::parse(&document.body, parser_type) else {
        ::log::info!("Skipping unsupported document: {}", url);
        return None;
    };

    // Links resolve against the final URL; the record keeps the requested one.
    let mut record = parsed.into_record(&document.url, filter);
    record.url = url.to_string();

    ::log::info!(
        "Successfully extracted {} ({} links) in {:.2} seconds",
        url,
        record.outbound_links.len(),
        started.elapsed().as_secs_f64()
    );
    Some(record)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crawlers::FetchedDocument;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    pub(crate) enum Behavior {
        Page(String),
        Status(u16),
        Hang,
    }

    /// Scripted fetcher that counts calls and tracks peak concurrency
    #[derive(Default)]
    pub(crate) struct MockFetcher {
        pages: HashMap<String, Behavior>,
        delay: Duration,
        calls: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        abandoned: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    /// Counts a hanging fetch whose future was dropped
    struct Abandoned<'a>(&'a AtomicUsize);

    impl Drop for Abandoned<'_> {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl MockFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with(mut self, url: &str, behavior: Behavior) -> Self {
            self.pages.insert(url.to_string(), behavior);
            self
        }

        pub(crate) fn with_page(self, url: &str, html: &str) -> Self {
            self.with(url, Behavior::Page(html.to_string()))
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        pub(crate) fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }

        pub(crate) fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }

        /// Hanging fetches that were dropped before completing
        pub(crate) fn abandoned(&self) -> usize {
            self.abandoned.load(Ordering::SeqCst)
        }

        pub(crate) fn shutdowns(&self) -> usize {
            self.shutdowns.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedDocument, FetchError> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let behavior = self.pages.get(url).cloned();
            let result = match behavior {
                Some(Behavior::Page(body)) => Ok(FetchedDocument {
                    url: url.to_string(),
                    content_type: Some("text/html".to_string()),
                    body,
                }),
                Some(Behavior::Status(code)) => Err(FetchError::Status(code)),
                Some(Behavior::Hang) => {
                    let _guard = Abandoned(&self.abandoned);
                    std::future::pending().await
                }
                None => Err(FetchError::Transport("connection refused".into())),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn page(title: &str, body: &str) -> String {
        format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
    }

    fn coordinator(fetcher: Arc<MockFetcher>, config: CoordinatorConfig) -> Coordinator {
        Coordinator::new(fetcher, Arc::new(LinkFilter::default()), config)
    }

    fn fast_config() -> CoordinatorConfig {
        CoordinatorConfig {
            max_concurrency: 8,
            fetch_timeout: Duration::from_millis(200),
            ..CoordinatorConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn duplicates_fetched_once() {
        for max_concurrency in 1..=8 {
            let fetcher = Arc::new(
                MockFetcher::new()
                    .with_page("https://a.com/one", &page("One", "<p>one</p>"))
                    .with_page("https://a.com/two", &page("Two", "<p>two</p>"))
                    .with_delay(Duration::from_millis(10)),
            );
            let urls = vec![
                "https://a.com/one".to_string(),
                "https://a.com/two".to_string(),
                "https://a.com/one".to_string(),
                "https://a.com/one#intro".to_string(),
                "https://a.com/two".to_string(),
            ];
            let config = CoordinatorConfig {
                max_concurrency,
                ..fast_config()
            };

            let records = coordinator(Arc::clone(&fetcher), config).run(urls).await;

            assert_eq!(records.len(), 2, "max_concurrency {max_concurrency}");
            let distinct: HashSet<_> = records.iter().map(|r| r.url.as_str()).collect();
            assert_eq!(distinct.len(), 2);
            assert_eq!(fetcher.total_calls(), 2, "max_concurrency {max_concurrency}");
            assert_eq!(fetcher.calls("https://a.com/one"), 1);
            assert!(fetcher.peak() <= max_concurrency);
        }
    }

    #[tokio::test]
    async fn timed_out_fetch_is_dropped() {
        let fetcher = Arc::new(MockFetcher::new().with("https://slow.com/", Behavior::Hang));

        let records = coordinator(Arc::clone(&fetcher), fast_config())
            .run(vec!["https://slow.com/".to_string()])
            .await;

        assert!(records.is_empty());
        assert_eq!(fetcher.abandoned(), 1);
    }

    #[tokio::test]
    async fn shutdown_reaches_the_fetcher() {
        let fetcher = Arc::new(MockFetcher::new());
        coordinator(Arc::clone(&fetcher), fast_config()).shutdown().await;
        assert_eq!(fetcher.shutdowns(), 1);
    }

    #[tokio::test]
    async fn failures_do_not_abort_batch() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page("https://ok.com/", &page("Ok", "<p>fine</p>"))
                .with("https://missing.com/", Behavior::Status(404))
                .with("https://slow.com/", Behavior::Hang),
        );
        let urls = vec![
            "https://slow.com/".to_string(),
            "https://missing.com/".to_string(),
            "https://ok.com/".to_string(),
            "https://refused.com/".to_string(),
        ];

        let records = coordinator(fetcher, fast_config()).run(urls).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://ok.com/");
        assert_eq!(records[0].title, "Ok");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded() {
        let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(20));
        let mut urls = Vec::new();
        for i in 0..12 {
            let url = format!("https://a.com/{i}");
            fetcher = fetcher.with_page(&url, &page("P", "<p>x</p>"));
            urls.push(url);
        }
        let fetcher = Arc::new(fetcher);
        let config = CoordinatorConfig {
            max_concurrency: 3,
            ..fast_config()
        };

        let records = coordinator(Arc::clone(&fetcher), config).run(urls).await;

        assert_eq!(records.len(), 12);
        assert!(fetcher.peak() <= 3, "peak was {}", fetcher.peak());
    }

    #[tokio::test]
    async fn records_keep_input_order() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page("https://a.com/1", &page("1", ""))
                .with_page("https://a.com/2", &page("2", ""))
                .with_page("https://a.com/3", &page("3", "")),
        );
        let urls = ["https://a.com/3", "https://a.com/1", "https://a.com/2"]
            .map(String::from)
            .to_vec();

        let records = coordinator(fetcher, fast_config()).run(urls).await;
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn unsupported_documents_produce_no_record() {
        let fetcher = Arc::new(MockFetcher::new().with_page("https://a.com/logo.png", "binary"));
        let records = coordinator(fetcher, fast_config())
            .run(vec!["https://a.com/logo.png".to_string()])
            .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn depth_zero_does_not_follow_links() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page("https://a.com/", &page("Root", "<a href=\"/b\">b</a>"))
                .with_page("https://a.com/b", &page("B", "")),
        );
        let records = coordinator(Arc::clone(&fetcher), fast_config())
            .run(vec!["https://a.com/".to_string()])
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outbound_links.len(), 1);
        assert_eq!(fetcher.calls("https://a.com/b"), 0);
    }

    #[tokio::test]
    async fn expansion_follows_links_once() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page(
                    "https://a.com/",
                    &page("Root", "<a href=\"/b\">b</a><a href=\"/c\">c</a>"),
                )
                .with_page("https://a.com/b", &page("B", "<a href=\"/\">home</a><a href=\"/c\">c</a>"))
                .with_page("https://a.com/c", &page("C", "<a href=\"/b\">b</a>")),
        );
        let config = CoordinatorConfig {
            expand_depth: 3,
            ..fast_config()
        };

        let records = coordinator(Arc::clone(&fetcher), config)
            .run(vec!["https://a.com/".to_string()])
            .await;

        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Root", "B", "C"]);
        assert_eq!(fetcher.calls("https://a.com/"), 1);
        assert_eq!(fetcher.calls("https://a.com/b"), 1);
        assert_eq!(fetcher.calls("https://a.com/c"), 1);
    }

    #[tokio::test]
    async fn expansion_respects_page_limit() {
        let mut body = String::new();
        let mut fetcher = MockFetcher::new();
        for i in 0..10 {
            body.push_str(&format!("<a href=\"/p{i}\">p</a>"));
            fetcher = fetcher.with_page(&format!("https://a.com/p{i}"), &page("P", ""));
        }
        let fetcher = Arc::new(fetcher.with_page("https://a.com/", &page("Root", &body)));
        let config = CoordinatorConfig {
            expand_depth: 1,
            max_pages: 4,
            ..fast_config()
        };

        let records = coordinator(Arc::clone(&fetcher), config)
            .run(vec!["https://a.com/".to_string()])
            .await;

        assert_eq!(records.len(), 4);
        assert_eq!(fetcher.total_calls(), 4);
    }
}
