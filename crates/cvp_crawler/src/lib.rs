pub mod article;
pub mod cli;
pub mod crawler;
pub mod fetch;
pub mod listing;
pub mod logging;
pub mod normalize;
pub mod result;

pub use cli::CrawlArgs;
pub use crawler::{CrawlerConfig, CvprCrawler, TaskOutcome};
pub use fetch::{FetchCause, FetchError, FetchGateway};
pub use logging::{init_logging, Logger};
pub use result::{CrawlResult, ResultAggregator};

pub mod prelude {
    pub use super::crawler::{CrawlerConfig, CvprCrawler};
    pub use super::result::CrawlResult;
    pub use cvp_core::{Article, Error, Result};
}
