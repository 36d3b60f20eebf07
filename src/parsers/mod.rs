pub mod html;
pub mod text;


use crate::filter::LinkFilter;
use crate::results::{NO_TITLE, PageRecord};
use url::Url;

/// Enum to represent the kinds of documents we can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserType {
    /// HTML parser
    Html,
    /// Plain text parser
    Text,
    /// Binary files and web assets, never parsed
    Unsupported,
}

impl ParserType {
    /// Determines the parser type from the response content type, falling
    /// back to the URL when the server did not send one. Asset URLs are
    /// never parsed, whatever content type the server claims.
    pub fn detect(content_type: Option<&str>, url: &str) -> Self {
        if is_asset_path(&url_path(url)) {
            ::log::debug!("Classifying asset as Unsupported: {}", url);
            return ParserType::Unsupported;
        }
        if let Some(content_type) = content_type {
            let mime = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            match mime.as_str() {
                "text/html" | "application/xhtml+xml" => return ParserType::Html,
                "text/plain" | "text/markdown" => return ParserType::Text,
                _ if mime.starts_with("image/")
                    || mime.starts_with("audio/")
                    || mime.starts_with("video/")
                    || mime == "application/pdf"
                    || mime == "application/octet-stream" =>
                {
                    ::log::debug!("Classifying as Unsupported ({}): {}", mime, url);
                    return ParserType::Unsupported;
                }
                _ => {}
            }
        }
        Self::from_url(url)
    }

    /// Determines the parser type based on the URL path
    pub fn from_url(url: &str) -> Self {
        let path = url_path(url);

        if path.ends_with(".txt") || path.ends_with(".md") {
            ::log::debug!("Classifying as Text: {}", url);
            ParserType::Text
        } else if is_asset_path(&path) {
            ::log::debug!("Classifying as Unsupported: {}", url);
            ParserType::Unsupported
        } else {
            ParserType::Html
        }
    }
}

/// Images, stylesheets, scripts and archives
const ASSET_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".webp", ".css", ".js", ".pdf", ".zip",
];

/// Lowercased path of `url`, or the whole string when it does not parse
fn url_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase())
}

fn is_asset_path(path: &str) -> bool {
    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Structured view of a fetched document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub title: Option<String>,
    pub text_blocks: Vec<String>,
    pub meta_pairs: Vec<(String, String)>,
    pub anchors: Vec<String>,
}

impl ParsedDocument {
    /// Turn the parsed document into a [`PageRecord`] for `url`.
    ///
    /// Content is every text block followed by a newline. Outbound links are
    /// the anchors that survive `filter`, resolved against `url`.
    pub fn into_record(self, url: &str, filter: &LinkFilter) -> PageRecord {
        let content = self
            .text_blocks
            .iter()
            .fold(String::new(), |mut acc, block| {
                acc.push_str(block);
                acc.push('\n');
                acc
            });

        let outbound_links = match Url::parse(url) {
            Ok(base) => filter.clean_links(&base, &self.anchors),
            Err(e) => {
                ::log::warn!("Cannot resolve links on {}: {}", url, e);
                Default::default()
            }
        };

        PageRecord {
            url: url.to_string(),
            title: self.title.unwrap_or_else(|| NO_TITLE.to_string()),
            content,
            metadata: self.meta_pairs.into_iter().collect(),
            outbound_links,
        }
    }
}

/// Main parser that delegates to specific format parsers
pub struct Parser;

impl Parser {
    /// Parse content based on the parser type. Returns `None` for
    /// unsupported documents.
    pub fn parse(content: &str, parser_type: ParserType) -> Option<ParsedDocument> {
        match parser_type {
            ParserType::Html => Some(html::parse(content)),
            ParserType::Text => Some(text::parse(content)),
            ParserType::Unsupported => None,
        }
    }
}
