use std::collections::{BTreeMap, HashSet};
use std::fmt;

use cvp_core::Article;

use crate::normalize::dedup_key;

/// Output of one crawl. Built fresh for every invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlResult {
    /// Accepted articles in completion order.
    pub articles: Vec<Article>,
    /// URLs that could not be fetched or parsed.
    pub failures: Vec<String>,
    /// Titles rejected because an equivalent title was already accepted.
    pub duplicates: Vec<String>,
    pub per_year_counts: BTreeMap<String, usize>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_for_year(&self, year: &str) -> usize {
        self.per_year_counts.get(year).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        let year_stats = self
            .per_year_counts
            .iter()
            .map(|(year, count)| format!("{}:{}", year, count))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "total={} articles, failures={}, duplicates={}, year_counts={{ {} }}",
            self.articles.len(),
            self.failures.len(),
            self.duplicates.len(),
            year_stats
        )
    }
}

impl fmt::Display for CrawlResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    Duplicate,
}

/// The single writer of a [`CrawlResult`]. Owns the seen-title set, which
/// spans every year of the crawl.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    result: CrawlResult,
    seen_titles: HashSet<String>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, url: impl Into<String>) {
        self.result.failures.push(url.into());
    }

    /// Accepts `article` unless its title key has been seen, in which case the
    /// original title is recorded as a duplicate and the article is dropped.
    pub fn offer(&mut self, article: Article) -> Offer {
        let key = dedup_key(&article.title);
        if !self.seen_titles.insert(key) {
            self.result.duplicates.push(article.title);
            return Offer::Duplicate;
        }

        *self
            .result
            .per_year_counts
            .entry(article.year.clone())
            .or_insert(0) += 1;
        self.result.articles.push(article);
        Offer::Accepted
    }

    pub fn result(&self) -> &CrawlResult {
        &self.result
    }

    pub fn finish(self) -> CrawlResult {
        self.result
    }
}
