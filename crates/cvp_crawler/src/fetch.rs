//! HTTP gateway shared by every request of a crawl.
//!
//! All requests go through one permit pool, so at most `concurrency` requests
//! are in flight no matter how many tasks are waiting on the gateway.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::Semaphore;

use cvp_core::{Error, Result};

#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("permit pool closed")]
    PoolClosed,
}

#[derive(Debug, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    fn new(url: &str, cause: impl Into<FetchCause>) -> Self {
        Self {
            url: url.to_string(),
            cause: cause.into(),
        }
    }
}

#[derive(Clone)]
pub struct FetchGateway {
    client: Client,
    permits: Arc<Semaphore>,
    concurrency: usize,
}

impl FetchGateway {
    pub fn new(concurrency: usize, timeout: Duration, user_agent: &str) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::Config("concurrency must be positive".to_string()));
        }
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// GETs `url` and returns the body. Non-2xx statuses are errors; nothing is retried.
    ///
    /// The permit is held until the body has been read and is released before
    /// the caller parses it. A cancelled call releases its permit on drop.
    pub async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FetchError::new(url, FetchCause::PoolClosed))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, FetchCause::Status(status)));
        }

        response.text().await.map_err(|e| FetchError::new(url, e))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Permits not currently held by an in-flight request.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
