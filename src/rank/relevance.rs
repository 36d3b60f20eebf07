//! TF-IDF relevance of chunks to a question.
//!
//! The vocabulary and document frequencies come from the chunks alone; the
//! question is projected onto that vocabulary, so question terms that no
//! chunk contains carry no weight.

use crate::results::{Chunk, RankedChunk};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Sparse L2-normalised term vector
pub type TermVector = HashMap<usize, f64>;

/// Lowercased word tokens of two or more characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Vocabulary and smoothed inverse document frequencies
#[derive(Debug, Clone, Default)]
pub struct TfIdf {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdf {
    /// Learns the vocabulary from `documents`.
    ///
    /// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();

        for doc in documents {
            let mut seen = vec![];
            for token in tokenize(doc.as_ref()) {
                let next = vocabulary.len();
                let id = *vocabulary.entry(token).or_insert(next);
                if id == df.len() {
                    df.push(0);
                }
                if !seen.contains(&id) {
                    seen.push(id);
                    df[id] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    #[cfg(test)]
    pub(crate) fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Raw term counts weighted by idf, then L2-normalised. Unknown terms are
    /// dropped; a text with no known terms yields an empty vector.
    pub fn transform(&self, text: &str) -> TermVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&id) = self.vocabulary.get(&token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        for (id, weight) in counts.iter_mut() {
            *weight *= self.idf[*id];
        }

        let norm = counts.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in counts.values_mut() {
                *weight /= norm;
            }
        }
        counts
    }
}

/// Cosine similarity between two sparse vectors. Zero if either is empty.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(id, w)| large.get(id).map(|v| w * v))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Scores every chunk against `question` and returns the `top_k` best,
/// highest first. Ties keep chunk order.
pub fn rank(chunks: &[Chunk], question: &str, top_k: usize) -> Vec<RankedChunk> {
    if chunks.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let model = TfIdf::fit(&chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>());
    let query = model.transform(question);

    let mut ranked: Vec<RankedChunk> = chunks
        .iter()
        .map(|chunk| RankedChunk {
            score: cosine(&model.transform(&chunk.text), &query),
            chunk: chunk.clone(),
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_k);
    ranked
}
