//! Sentence boundary detection.
//!
//! [`SentenceSplitter::Rules`] is the default detector; it knows common
//! English abbreviations and initials. [`SentenceSplitter::Simple`] is the
//! plain regex fallback that breaks after every `.`, `!` or `?` followed by
//! whitespace.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SIMPLE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"));

/// Lowercased tokens that end in a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "co", "corp", "no", "fig", "approx", "dept", "est", "jan", "feb", "mar", "apr", "jun", "jul",
    "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "u.k", "a.m", "p.m",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentenceSplitter {
    #[default]
    Rules,
    Simple,
}

impl SentenceSplitter {
    /// Splits `text` into trimmed, non-empty sentences in order
    pub fn split(&self, text: &str) -> Vec<String> {
        match self {
            SentenceSplitter::Rules => split_rules(text),
            SentenceSplitter::Simple => split_simple(text),
        }
    }
}

/// Regex fallback
pub fn split_simple(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SIMPLE_BOUNDARY.find_iter(text) {
        // keep the terminator, drop the whitespace
        push_trimmed(&mut sentences, &text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

pub fn split_rules(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !is_terminator(c) {
            i += 1;
            continue;
        }

        // swallow runs like "?!", "..." and closing quotes/brackets
        let mut j = i + 1;
        while j < chars.len() && (is_terminator(chars[j].1) || is_closing(chars[j].1)) {
            j += 1;
        }

        if j < chars.len() && chars[j].1.is_whitespace() {
            let end = chars[j].0;
            let next = chars[j..].iter().map(|(_, ch)| *ch).find(|ch| !ch.is_whitespace());
            let boundary = c != '.' || period_ends_sentence(&text[start..pos], next);
            if boundary {
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
        }
        i = j;
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’')
}

/// `before` is the sentence text up to (not including) the period
fn period_ends_sentence(before: &str, next: Option<char>) -> bool {
    let Some(next) = next else {
        return true;
    };
    if next.is_lowercase() {
        return false;
    }

    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return false;
    }
    !ABBREVIATIONS.contains(&word.as_str())
}

fn push_trimmed(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let s = split_rules("Rust is fast. Is it safe? Yes!  It is.");
        assert_eq!(s, vec!["Rust is fast.", "Is it safe?", "Yes!", "It is."]);
    }

    #[test]
    fn keeps_abbreviations_and_initials() {
        let s = split_rules("Dr. Smith met J. R. Tolkien at 5 p.m. Sunday. They talked, e.g. about Rust.");
        assert_eq!(
            s,
            vec![
                "Dr. Smith met J. R. Tolkien at 5 p.m. Sunday.",
                "They talked, e.g. about Rust."
            ]
        );
    }

    #[test]
    fn lowercase_continuation_is_not_a_boundary() {
        let s = split_rules("Version 1.2 was released in Jan. the next one later. Done.");
        assert_eq!(
            s,
            vec!["Version 1.2 was released in Jan. the next one later.", "Done."]
        );
    }

    #[test]
    fn closing_quotes_stay_with_sentence() {
        let s = split_rules("He said \"stop.\" Then he left.");
        assert_eq!(s, vec!["He said \"stop.\"", "Then he left."]);
    }

    #[test]
    fn newlines_without_punctuation_do_not_split() {
        let s = split_rules("Title: Rust\nURL: https://rust-lang.org\nContent:\nFast. Safe.");
        assert_eq!(
            s,
            vec!["Title: Rust\nURL: https://rust-lang.org\nContent:\nFast.", "Safe."]
        );
    }

    #[test]
    fn simple_fallback_splits_everywhere() {
        let s = split_simple("Dr. Smith arrived. He sat!  Why?");
        assert_eq!(s, vec!["Dr.", "Smith arrived.", "He sat!", "Why?"]);
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(split_rules("").is_empty());
        assert!(split_rules("   \n ").is_empty());
        assert!(split_simple("").is_empty());
    }

    #[test]
    fn splitter_enum_dispatches() {
        assert_eq!(SentenceSplitter::default(), SentenceSplitter::Rules);
        assert_eq!(SentenceSplitter::Simple.split("A. B."), vec!["A.", "B."]);
    }
}
