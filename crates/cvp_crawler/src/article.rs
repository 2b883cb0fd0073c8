use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use cvp_core::Article;

use crate::normalize::{clean_text, extract_authors};

lazy_static! {
    static ref ABSTRACT_SELECTOR: Selector =
        Selector::parse("#abstract").expect("Invalid abstract selector");
    static ref AUTHORS_SELECTOR: Selector =
        Selector::parse("#authors").expect("Invalid authors selector");
}

/// Visible text of an element, each text node trimmed and joined by a space.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a paper page. Returns `None` when the abstract or authors region is
/// missing, or when the abstract is empty once cleaned.
pub fn parse_article(html: &str, url: &str, title: &str, year: u32) -> Option<Article> {
    let document = Html::parse_document(html);

    let abstract_node = document.select(&ABSTRACT_SELECTOR).next()?;
    let authors_node = document.select(&AUTHORS_SELECTOR).next()?;

    let abstract_text = clean_text(&visible_text(abstract_node));
    if abstract_text.is_empty() {
        debug!("Empty abstract, skipping {}", url);
        return None;
    }
    let authors = extract_authors(&visible_text(authors_node));

    Some(Article::new(title, authors, year.to_string(), url, abstract_text))
}
