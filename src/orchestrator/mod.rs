//! Drives one research request from question to synthesized answer.

use crate::config::RankingConfig;
use crate::crawlers::Coordinator;
use crate::error::{ResearchError, Result};
use crate::filter::normalize_url;
use crate::graph::{centrality, CentralityConfig, LinkGraph};
use crate::llm::LanguageModel;
use crate::rank;
use crate::results::{Analysis, CentralPage, PageRecord, SynthesisRequest};
use crate::search::SearchProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;


/// Message returned for a missing or blank question
pub const NO_QUESTION: &str = "No question provided";

pub struct Synthesizer {
    search: Arc<dyn SearchProvider>,
    model: Arc<dyn LanguageModel>,
    coordinator: Coordinator,
    ranking: RankingConfig,
}

impl Synthesizer {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        model: Arc<dyn LanguageModel>,
        coordinator: Coordinator,
        ranking: RankingConfig,
    ) -> Self {
        Self {
            search,
            model,
            coordinator,
            ranking,
        }
    }

    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    /// Releases sessions held by the page transport
    pub async fn shutdown(&self) {
        self.coordinator.shutdown().await;
    }

    /// Answers `question` from freshly fetched web pages.
    ///
    /// # Errors
    ///
    /// - [`ResearchError::Input`] for a blank question
    /// - [`ResearchError::NoResults`] when the search returns nothing
    /// - [`ResearchError::NoDataScraped`] when no page could be extracted
    /// - [`ResearchError::Llm`] when the language model call fails
    pub async fn synthesize(&self, question: &str) -> Result<Analysis> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ResearchError::Input(NO_QUESTION.to_string()));
        }
        let started = Instant::now();

        let urls: Vec<String> = self
            .search
            .search(question)
            .await
            .into_iter()
            .map(|r| r.url)
            .collect();
        if urls.is_empty() {
            ::log::warn!("Search returned no results");
            return Err(ResearchError::NoResults);
        }
        ::log::info!("Fetching {} search results", urls.len());

        let records = self.coordinator.run(urls).await;
        if records.is_empty() {
            ::log::warn!("No pages could be extracted");
            return Err(ResearchError::NoDataScraped);
        }

        let central_pages = self.central_pages(&records);
        let request = self.build_request(question, &records, central_pages);

        ::log::info!(
            "Sending {} characters of ranked content to the language model",
            request.relevant_content.len()
        );
        let summary = match self.model.generate(&request.prompt()).await {
            Ok(summary) => summary,
            Err(e) => {
                ::log::error!("Language model call failed: {}", e);
                return Err(ResearchError::Llm(e));
            }
        };

        ::log::info!(
            "Generated {} character answer in {:.2} seconds",
            summary.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(Analysis {
            summary,
            central_pages: request.central_pages,
        })
    }

    /// Like [`synthesize`](Self::synthesize), but gives up with
    /// [`ResearchError::Cancelled`] as soon as `cancel` fires. In-flight
    /// fetches are aborted.
    pub async fn synthesize_with_cancel(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Analysis> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                ::log::info!("Request cancelled");
                ::log::debug!("Cancelled question: {:?}", question);
                Err(ResearchError::Cancelled)
            }
            result = self.synthesize(question) => result,
        }
    }

    /// Top pages by link centrality, as title and requested URL
    fn central_pages(&self, records: &[PageRecord]) -> Vec<CentralPage> {
        let graph = LinkGraph::build(records);
        let scores = centrality(&graph, &CentralityConfig::from(&self.ranking));

        let mut by_key: HashMap<String, &PageRecord> = HashMap::new();
        for record in records {
            by_key.entry(normalize_url(&record.url)).or_insert(record);
        }

        let pages: Vec<CentralPage> = scores
            .top(self.ranking.top_pages)
            .into_iter()
            .filter_map(|(url, score)| {
                ::log::debug!("Central page {} scored {:.4}", url, score);
                by_key.get(url).map(|record| CentralPage::from(*record))
            })
            .collect();
        ::log::info!(
            "Selected {} central pages from a graph of {} nodes and {} links",
            pages.len(),
            graph.len(),
            graph.edge_count()
        );
        pages
    }

    fn build_request(
        &self,
        question: &str,
        records: &[PageRecord],
        central_pages: Vec<CentralPage>,
    ) -> SynthesisRequest {
        let aggregated: String = records.iter().map(PageRecord::render_for_analysis).collect();
        let chunks = rank::split(
            &aggregated,
            self.ranking.chunk_size,
            self.ranking.sentence_splitter,
        );
        let ranked = rank::rank(&chunks, question, self.ranking.top_chunks);
        ::log::debug!(
            "Selected {} of {} chunks",
            ranked.len(),
            chunks.len()
        );
        SynthesisRequest::new(question, &ranked, central_pages)
    }
}
