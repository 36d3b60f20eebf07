use crate::parsers::ParsedDocument;

/// Parses a plain-text document. Each paragraph (separated by blank lines)
/// becomes one text block with its whitespace collapsed.
pub fn parse(text: &str) -> ParsedDocument {
    let text_blocks = split_into_paragraphs(text)
        .iter()
        .map(|lines| normalize_whitespace(&lines.join(" ")))
        .collect();

    ParsedDocument {
        text_blocks,
        ..ParsedDocument::default()
    }
}

/// Splits text into paragraphs based on empty lines
pub fn split_into_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Collapses runs of whitespace into single spaces
pub fn normalize_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}
