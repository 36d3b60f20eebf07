//! Directed hyperlink graph over fetched pages.

pub mod centrality;

pub use centrality::{centrality, CentralityConfig, CentralityScores};

use crate::filter::normalize_url;
use crate::results::PageRecord;
use std::collections::HashMap;

/// Nodes are the fetched pages, keyed by normalised URL. An edge `u -> v`
/// exists when `u` links to `v` and `v` was fetched too.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    out_edges: Vec<Vec<usize>>,
}

impl LinkGraph {
    pub fn build(records: &[PageRecord]) -> Self {
        let mut graph = LinkGraph::default();
        let mut owners: Vec<&PageRecord> = Vec::new();

        for record in records {
            let key = normalize_url(&record.url);
            if graph.index.contains_key(&key) {
                continue;
            }
            graph.index.insert(key.clone(), graph.nodes.len());
            graph.nodes.push(key);
            owners.push(record);
        }

        graph.out_edges = owners
            .iter()
            .map(|record| {
                let mut targets: Vec<usize> = record
                    .outbound_links
                    .iter()
                    .filter_map(|link| graph.index.get(&normalize_url(link)).copied())
                    .collect();
                targets.sort_unstable();
                targets.dedup();
                targets
            })
            .collect();

        ::log::debug!(
            "Built link graph with {} nodes and {} edges",
            graph.len(),
            graph.edge_count()
        );
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.out_edges.iter().map(Vec::len).sum()
    }

    /// Node keys in insertion order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, url: &str) -> bool {
        self.index.contains_key(&normalize_url(url))
    }

    /// Normalised URLs `url` links to
    #[cfg(test)]
    pub(crate) fn successors(&self, url: &str) -> Vec<&str> {
        match self.index.get(&normalize_url(url)) {
            Some(&i) => self.out_edges[i]
                .iter()
                .map(|&j| self.nodes[j].as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn out_edges(&self) -> &[Vec<usize>] {
        &self.out_edges
    }
}
