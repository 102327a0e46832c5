use std::sync::LazyLock;

use scraper::{Html, Selector};

static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#job-description").expect("valid selector"));

/// Result of reading a job detail page.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Description(String),
    /// The page rendered without a description block (e.g. external redirect).
    Missing,
}

pub fn parse_description(html: &str) -> DetailOutcome {
    let document = Html::parse_document(html);

    let Some(block) = document.select(&DESCRIPTION).next() else {
        return DetailOutcome::Missing;
    };

    let text = html2text::from_read(block.inner_html().as_bytes(), 100);
    let text = text.trim();
    if text.is_empty() {
        return DetailOutcome::Missing;
    }

    DetailOutcome::Description(text.to_string())
}
