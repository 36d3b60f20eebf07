use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Title used when a page has no `<title>`
pub const NO_TITLE: &str = "No title found";

/// A candidate URL returned by the search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Structured result of fetching and parsing one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL the page was requested with
    pub url: String,

    /// Page title, or [`NO_TITLE`]
    pub title: String,

    /// Text blocks in document order, each followed by a newline
    pub content: String,

    /// `<meta name=… content=…>` pairs
    pub metadata: BTreeMap<String, String>,

    /// Same-origin absolute links found on the page
    pub outbound_links: BTreeSet<String>,
}

impl PageRecord {
    /// Renders the page for the aggregated content blob, tagged with its
    /// title, URL and metadata so ranked chunks stay traceable.
    pub fn render_for_analysis(&self) -> String {
        let mut out = format!(
            "\nTitle: {}\nURL: {}\nContent:\n{}\n\n",
            self.title, self.url, self.content
        );
        if !self.metadata.is_empty() {
            out.push_str("Metadata:\n");
            for (name, value) in &self.metadata {
                out.push_str(&format!("{name}: {value}\n"));
            }
            out.push('\n');
        }
        out
    }
}

/// A sentence-aligned slice of the aggregated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the chunker output
    pub index: usize,
    pub text: String,
}

/// A chunk with its similarity to the question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub score: f64,
}

/// A central page as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralPage {
    pub title: String,
    pub url: String,
}

impl From<&PageRecord> for CentralPage {
    fn from(record: &PageRecord) -> Self {
        Self {
            title: record.title.clone(),
            url: record.url.clone(),
        }
    }
}

/// Everything the language model needs for one question
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub question: String,
    pub relevant_content: String,
    pub central_pages: Vec<CentralPage>,
}

impl SynthesisRequest {
    pub fn new(
        question: impl Into<String>,
        ranked: &[RankedChunk],
        central_pages: Vec<CentralPage>,
    ) -> Self {
        let relevant_content = ranked
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            question: question.into(),
            relevant_content,
            central_pages,
        }
    }

    /// Builds the single prompt sent to the language model.
    pub fn prompt(&self) -> String {
        format!(
            "Analyze the following material gathered from several web pages and answer this question: \"{question}\"\n\
             \n\
             {content}\n\
             \n\
             Write a thorough, well-organized answer that addresses the question directly. \
             Structure it with clear headings, subheadings and bullet points. \
             Explain complex ideas in plain terms and back key points with concrete examples. \
             Use bold or italics to highlight the most important details. \
             Keep it complete but concise and easy to read.\n\
             Do not mention that material was supplied to you, and avoid phrases such as \
             \"the provided data indicates\".",
            question = self.question,
            content = self.relevant_content,
        )
    }
}

/// Answer returned to the caller; serialises to the `/analyze` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub central_pages: Vec<CentralPage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PageRecord {
        PageRecord {
            url: "https://example.com/a".into(),
            title: "Example".into(),
            content: "First block.\nSecond block.\n".into(),
            metadata: BTreeMap::from([("description".to_string(), "An example".to_string())]),
            outbound_links: BTreeSet::new(),
        }
    }

    #[test]
    fn render_tags_title_url_and_metadata() {
        let text = record().render_for_analysis();
        assert!(text.contains("Title: Example\n"));
        assert!(text.contains("URL: https://example.com/a\n"));
        assert!(text.contains("Content:\nFirst block.\nSecond block.\n"));
        assert!(text.contains("Metadata:\ndescription: An example\n"));
    }

    #[test]
    fn render_omits_empty_metadata() {
        let mut page = record();
        page.metadata.clear();
        assert!(!page.render_for_analysis().contains("Metadata:"));
    }

    #[test]
    fn prompt_embeds_question_and_content() {
        let ranked = vec![
            RankedChunk {
                chunk: Chunk { index: 1, text: "Rust is a language.".into() },
                score: 0.9,
            },
            RankedChunk {
                chunk: Chunk { index: 0, text: "It is fast.".into() },
                score: 0.4,
            },
        ];
        let request = SynthesisRequest::new("What is Rust?", &ranked, vec![]);
        assert_eq!(request.relevant_content, "Rust is a language.\n\nIt is fast.");

        let prompt = request.prompt();
        assert!(prompt.contains("\"What is Rust?\""));
        assert!(prompt.contains("Rust is a language.\n\nIt is fast."));
        assert!(prompt.contains("Do not mention that material was supplied"));
    }

    #[test]
    fn analysis_serialises_to_api_shape() {
        let analysis = Analysis {
            summary: "answer".into(),
            central_pages: vec![CentralPage::from(&record())],
        };
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["summary"], "answer");
        assert_eq!(json["central_pages"][0]["title"], "Example");
        assert_eq!(json["central_pages"][0]["url"], "https://example.com/a");
    }
}
