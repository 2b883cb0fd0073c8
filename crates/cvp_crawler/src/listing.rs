use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::debug;

use crate::normalize::clean_text;

lazy_static! {
    static ref TITLE_LINK_SELECTOR: Selector =
        Selector::parse("dt.ptitle > a").expect("Invalid listing selector");
}

/// A paper discovered on a listing page, not yet confirmed to have a
/// parseable detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    /// Link target as written in the listing, usually relative to the archive root.
    pub href: String,
}

/// Extracts one candidate per title link. Links whose `href` is missing or
/// blank are skipped.
pub fn parse_listing(html: &str) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for anchor in document.select(&TITLE_LINK_SELECTOR) {
        let title = clean_text(&anchor.text().collect::<String>());
        match anchor.value().attr("href") {
            Some(href) if !href.trim().is_empty() => candidates.push(Candidate {
                title,
                href: href.trim().to_string(),
            }),
            _ => debug!("Skipping listing entry without link target: {}", title),
        }
    }

    candidates
}
