use crate::rank::SentenceSplitter;
use crate::results::Chunk;

/// Packs consecutive sentences into chunks of at most `chunk_size`
/// characters, joined by a single space.
///
/// A sentence longer than `chunk_size` becomes a chunk of its own; it is
/// never cut mid-sentence. Empty chunks are never produced.
pub fn split(text: &str, chunk_size: usize, splitter: SentenceSplitter) -> Vec<Chunk> {
    let mut texts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in splitter.split(text) {
        let len = sentence.chars().count();
        if !current.is_empty() && current_len + 1 + len > chunk_size {
            texts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current.is_empty() {
            current = sentence;
            current_len = len;
        } else {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + len;
        }
    }
    if !current.is_empty() {
        texts.push(current);
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { index, text })
        .collect()
}
