use crate::parsers::ParsedDocument;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text makes up the main content, in document order
const CONTENT_SELECTOR: &str = "p, h1, h2, h3, li";

/// Parses an HTML document into title, text blocks, meta pairs and anchors
pub fn parse(html: &str) -> ParsedDocument {
    let doc = Html::parse_document(html);

    let title = select_all(&doc, "title")
        .into_iter()
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let text_blocks = select_all(&doc, CONTENT_SELECTOR)
        .into_iter()
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>();

    let meta_pairs = select_all(&doc, "meta")
        .into_iter()
        .filter_map(|el| {
            let name = el.value().attr("name")?;
            let content = el.value().attr("content")?;
            Some((name.to_string(), content.to_string()))
        })
        .collect::<Vec<_>>();

    let anchors = select_all(&doc, "a")
        .into_iter()
        .filter_map(|el| el.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    ::log::debug!(
        "HTML parser found {} text blocks, {} meta tags, {} links",
        text_blocks.len(),
        meta_pairs.len(),
        anchors.len()
    );

    ParsedDocument {
        title,
        text_blocks,
        meta_pairs,
        anchors,
    }
}

fn select_all<'a>(doc: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(selector) else {
        ::log::error!("Invalid CSS selector: {}", selector);
        return Vec::new();
    };
    doc.select(&selector).collect()
}
