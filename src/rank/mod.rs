//! Chunking and relevance ranking of aggregated page text.

pub mod chunker;
pub mod relevance;
pub mod sentences;

pub use chunker::split;
pub use relevance::rank;
pub use sentences::SentenceSplitter;
