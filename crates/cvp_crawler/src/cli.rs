use std::time::Duration;

use clap::Args;

use cvp_core::{Error, Result};

use crate::crawler::{CrawlerConfig, DEFAULT_YEARS};

/// Crawl options shared by every entry point that runs the crawler.
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Years to crawl (repeatable)
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_YEARS)]
    pub years: Vec<u32>,

    /// Maximum number of papers accepted per year
    #[arg(long)]
    pub limit: Option<usize>,

    /// Maximum number of simultaneous HTTP requests
    #[arg(long, default_value_t = 5)]
    pub concurrency: usize,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30.0)]
    pub timeout: f64,
}

impl CrawlArgs {
    pub fn to_config(&self) -> Result<CrawlerConfig> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err(Error::Config(format!("timeout must be a positive number of seconds, got {}", self.timeout)));
        }
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .map_err(|e| Error::Config(format!("timeout of {} seconds is out of range: {}", self.timeout, e)))?;
        let config = CrawlerConfig::default()
            .with_years(self.years.iter().copied())
            .with_limit(self.limit)
            .with_concurrency(self.concurrency)
            .with_timeout(timeout);
        config.validate()?;
        Ok(config)
    }
}
