use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tokio::task::{Id, JoinSet};
use url::Url;

use cvp_core::{Error, Result};

use crate::article::parse_article;
use crate::fetch::{FetchError, FetchGateway};
use crate::listing::{parse_listing, Candidate};
use crate::logging::Logger;
use crate::result::{CrawlResult, Offer, ResultAggregator};

pub const BASE_URL: &str = "https://openaccess.thecvf.com";
pub const LISTING_TEMPLATE: &str = "https://openaccess.thecvf.com/CVPR{year}?day=all";
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; CVPaperReader/0.1; +https://github.com/)";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_YEARS: [u32; 3] = [2023, 2024, 2025];

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub years: BTreeSet<u32>,
    pub concurrency: usize,
    pub timeout: Duration,
    /// Maximum accepted articles per year. `None` means unbounded.
    pub limit: Option<usize>,
    pub base_url: String,
    /// Listing URL with a `{year}` placeholder.
    pub listing_template: String,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.into_iter().collect(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            limit: None,
            base_url: BASE_URL.to_string(),
            listing_template: LISTING_TEMPLATE.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn with_years(mut self, years: impl IntoIterator<Item = u32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points the crawler at another archive root. The listing template is
    /// rebuilt as `{base_url}/CVPR{year}?day=all`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.base_url = base_url.to_string();
        self.listing_template = format!("{}/CVPR{{year}}?day=all", base_url);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            return Err(Error::Config("at least one year is required".to_string()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be positive".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        if self.limit == Some(0) {
            return Err(Error::Config("limit must be positive when set".to_string()));
        }
        if !self.listing_template.contains("{year}") {
            return Err(Error::Config(format!(
                "listing template has no {{year}} placeholder: {}",
                self.listing_template
            )));
        }
        Ok(())
    }

    pub fn listing_url(&self, year: u32) -> String {
        self.listing_template.replace("{year}", &year.to_string())
    }
}

/// What a single fetch-and-parse task hands back to the collecting loop.
#[derive(Debug)]
pub enum TaskOutcome {
    Parsed(cvp_core::Article),
    FetchFailed(FetchError),
    Unparseable { url: String },
}

pub struct CvprCrawler {
    config: CrawlerConfig,
    base_url: Url,
    gateway: FetchGateway,
}

impl CvprCrawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let gateway = FetchGateway::new(config.concurrency, config.timeout, &config.user_agent)?;
        Ok(Self {
            config,
            base_url,
            gateway,
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn gateway(&self) -> &FetchGateway {
        &self.gateway
    }

    /// Crawls every configured year in ascending order. Per-page failures end
    /// up in the result; this never fails as a whole.
    pub async fn crawl(&self) -> CrawlResult {
        let mut aggregator = ResultAggregator::new();
        for &year in &self.config.years {
            self.crawl_year(year, &mut aggregator).await;
        }
        aggregator.finish()
    }

    async fn crawl_year(&self, year: u32, aggregator: &mut ResultAggregator) {
        let log = Logger::new().with_prefix(format!("[CVPR{}]", year));

        let listing_url = self.config.listing_url(year);
        let listing_html = match self.gateway.fetch(&listing_url).await {
            Ok(html) => html,
            Err(e) => {
                log.error(&format!("Listing fetch failed, skipping year: {}", e));
                aggregator.record_failure(listing_url);
                return;
            }
        };

        let candidates = parse_listing(&listing_html);
        log.info(&format!("{} candidate papers", candidates.len()));

        let mut tasks = JoinSet::new();
        let mut task_urls: HashMap<Id, String> = HashMap::new();
        for candidate in candidates {
            let url = match self.base_url.join(&candidate.href) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    log.warn(&format!("Unresolvable link {}: {}", candidate.href, e));
                    aggregator.record_failure(candidate.href);
                    continue;
                }
            };
            let handle = tasks.spawn(fetch_article(self.gateway.clone(), candidate, url.clone(), year));
            task_urls.insert(handle.id(), url);
        }

        let mut accepted = 0usize;
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => {
                    // a panicking task still accounts for its candidate
                    let url = task_urls.remove(&e.id()).unwrap_or_default();
                    log.error(&format!("Task for {} did not complete: {}", url, e));
                    aggregator.record_failure(url);
                    continue;
                }
            };

            match outcome {
                TaskOutcome::FetchFailed(e) => {
                    log.warn(&format!("Article fetch failed: {}", e));
                    aggregator.record_failure(e.url);
                }
                TaskOutcome::Unparseable { url } => {
                    log.warn(&format!("Article page could not be parsed, skipping {}", url));
                    aggregator.record_failure(url);
                }
                TaskOutcome::Parsed(article) => {
                    let title = article.title.clone();
                    if aggregator.offer(article) == Offer::Duplicate {
                        log.debug(&format!("Duplicate title skipped: {}", title));
                        continue;
                    }
                    accepted += 1;
                    if self.config.limit.is_some_and(|limit| accepted >= limit) {
                        log.info(&format!(
                            "Reached limit={}, cancelling {} outstanding tasks",
                            accepted,
                            tasks.len()
                        ));
                        break;
                    }
                }
            }
        }

        // Early stop: whatever is still running belongs to an abandoned year.
        // Wait for every task to settle so no request or permit leaks into
        // the next year; late results are discarded.
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

async fn fetch_article(gateway: FetchGateway, candidate: Candidate, url: String, year: u32) -> TaskOutcome {
    let html = match gateway.fetch(&url).await {
        Ok(html) => html,
        Err(e) => return TaskOutcome::FetchFailed(e),
    };
    match parse_article(&html, &url, &candidate.title, year) {
        Some(article) => TaskOutcome::Parsed(article),
        None => TaskOutcome::Unparseable { url },
    }
}
