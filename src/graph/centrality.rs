//! Damped random-walk centrality (PageRank) over a [`LinkGraph`].

use crate::config::RankingConfig;
use crate::graph::LinkGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralityConfig {
    pub damping: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1.0e-6,
        }
    }
}

impl From<&RankingConfig> for CentralityConfig {
    fn from(config: &RankingConfig) -> Self {
        Self {
            damping: config.damping,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }
}

/// Score per node, in graph insertion order. Scores sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentralityScores {
    scores: Vec<(String, f64)>,
}

impl CentralityScores {
    #[cfg(test)]
    pub(crate) fn get(&self, url: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(u, s)| (u.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The `k` highest-scoring URLs. Equal scores keep insertion order.
    pub fn top(&self, k: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

/// Power iteration from the uniform vector. Mass on nodes without outgoing
/// edges is spread uniformly over all nodes.
#[allow(clippy::cast_precision_loss)]
pub fn centrality(graph: &LinkGraph, config: &CentralityConfig) -> CentralityScores {
    if graph.is_empty() {
        return CentralityScores::default();
    }

    let n = graph.len();
    let nf = n as f64;
    let edges = graph.out_edges();
    let mut ranks = vec![1.0 / nf; n];
    let mut converged = false;

    for iteration in 0..config.max_iterations {
        let next = iterate_once(&ranks, edges, config.damping);
        let delta: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
        ranks = next;
        if delta < nf * config.tolerance {
            ::log::debug!("Centrality converged after {} iterations", iteration + 1);
            converged = true;
            break;
        }
    }

    if !converged {
        ::log::warn!(
            "Centrality did not converge within {} iterations; using last estimate",
            config.max_iterations
        );
    }

    normalize(&mut ranks);

    CentralityScores {
        scores: graph.nodes().iter().cloned().zip(ranks).collect(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn iterate_once(ranks: &[f64], edges: &[Vec<usize>], damping: f64) -> Vec<f64> {
    let n = ranks.len() as f64;
    let dangling: f64 = edges
        .iter()
        .zip(ranks)
        .filter(|(targets, _)| targets.is_empty())
        .map(|(_, rank)| rank)
        .sum();

    let base = (1.0 - damping) / n + damping * dangling / n;
    let mut next = vec![base; ranks.len()];

    for (source, targets) in edges.iter().enumerate() {
        if targets.is_empty() {
            continue;
        }
        let share = damping * ranks[source] / targets.len() as f64;
        for &target in targets {
            next[target] += share;
        }
    }
    next
}

fn normalize(ranks: &mut [f64]) {
    let total: f64 = ranks.iter().sum();
    if total > 0.0 {
        for rank in ranks.iter_mut() {
            *rank /= total;
        }
    }
}
