//! Text cleanup shared by the listing and article parsers, plus the title
//! key used to detect duplicate papers.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("Invalid whitespace pattern");
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9]+").expect("Invalid key pattern");
    static ref PROCEEDINGS_RE: Regex = Regex::new(r"^Proceedings.*").expect("Invalid boilerplate pattern");
}

/// NFKC-normalizes `value`, folds non-breaking spaces, collapses whitespace
/// runs to a single space and trims.
pub fn clean_text(value: &str) -> String {
    let normalized: String = value.nfkc().collect();
    let normalized = normalized.replace('\u{a0}', " ");
    WHITESPACE_RE.replace_all(&normalized, " ").trim().to_string()
}

/// Canonical form of a title. Two titles are duplicates iff their keys match.
pub fn dedup_key(title: &str) -> String {
    let lowered = clean_text(title).to_lowercase();
    NON_ALNUM_RE.replace_all(&lowered, " ").trim().to_string()
}

/// The author list precedes the first `;`. Anything that is only the
/// proceedings citation is dropped.
pub fn extract_authors(raw_text: &str) -> String {
    let cleaned = clean_text(raw_text);
    let head = cleaned.split(';').next().unwrap_or_default().trim();
    PROCEEDINGS_RE
        .replace(head, "")
        .trim_matches(|c| c == ',' || c == ' ')
        .to_string()
}
