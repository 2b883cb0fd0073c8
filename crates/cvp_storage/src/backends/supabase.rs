use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use cvp_core::{Article, ArticleStorage, Error, Result};

use crate::{BackendConfig, RetryPolicy};

/// Writes articles through Supabase's PostgREST interface.
pub struct SupabaseStorage {
    client: Client,
    rest_url: Url,
    config: BackendConfig,
    retry: RetryPolicy,
}

impl SupabaseStorage {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let base = Url::parse(&config.url).map_err(|e| Error::InvalidUrl(format!("{}: {}", config.url, e)))?;
        let rest_url = base
            .join(&format!("rest/v1/{}", config.table))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.url, e)))?;
        Ok(Self {
            client: Client::builder().build()?,
            rest_url,
            config,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("Supabase {} failed ({}): {}", action, status, body);
        Err(Error::Storage(format!("Supabase {} failed with {}: {}", action, status, body)))
    }

    async fn post_records(&self, records: &[Value]) -> Result<()> {
        let mut url = self.rest_url.clone();
        url.query_pairs_mut().append_pair("on_conflict", "url");
        let response = self
            .request(self.client.post(url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(records)
            .send()
            .await?;
        Self::check(response, "upsert").await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStorage for SupabaseStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()> {
        let records: Vec<Value> = articles.iter().map(Article::to_record).collect();
        if records.is_empty() {
            debug!("No records to upsert, skipping");
            return Ok(());
        }

        info!("Upserting {} records into {}", records.len(), self.config.table);
        self.retry.run(|| self.post_records(&records)).await?;
        debug!("Upsert into {} done", self.config.table);
        Ok(())
    }

    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let mut url = self.rest_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", &limit.to_string());
        let response = self.request(self.client.get(url)).send().await?;
        let response = Self::check(response, "select").await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let articles: Vec<Article> = response.json().await?;
        debug!("Fetched {} records", articles.len());
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn storage(url: String) -> SupabaseStorage {
        SupabaseStorage::new(BackendConfig::new(url, "service-key"))
            .unwrap()
            .with_retry(RetryPolicy::no_delay(3))
    }

    fn article() -> Article {
        let mut article = Article::new("Paper", "Jane Doe", "2024", "https://openaccess.thecvf.com/p.html", "Abstract.");
        article.embedding = Some(vec![0.5]);
        article
    }

    #[tokio::test]
    async fn test_upsert_posts_records_with_conflict_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/Articles")
            .match_query(Matcher::UrlEncoded("on_conflict".to_string(), "url".to_string()))
            .match_header("apikey", "service-key")
            .match_header("authorization", "Bearer service-key")
            .match_header("prefer", Matcher::Regex("resolution=merge-duplicates".to_string()))
            .match_body(Matcher::Json(json!([{
                "title": "Paper",
                "authors": "Jane Doe",
                "year": "2024",
                "url": "https://openaccess.thecvf.com/p.html",
                "abstract": "Abstract.",
                "abstract_embedding": [0.5]
            }])))
            .with_status(201)
            .create_async()
            .await;

        storage(server.url()).upsert_articles(&[article()]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upsert_retries_then_fails() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/Articles")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .expect(3)
            .create_async()
            .await;

        let err = storage(server.url()).upsert_articles(&[article()]).await.unwrap_err();
        assert!(matches!(err, Error::Storage(msg) if msg.contains("boom")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_upsert_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        storage(server.url()).upsert_articles(&[]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_articles() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/Articles")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".to_string(), "*".to_string()),
                Matcher::UrlEncoded("limit".to_string(), "5".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([article().to_record()]).to_string())
            .create_async()
            .await;

        let articles = storage(server.url()).list_articles(5).await.unwrap();
        assert_eq!(articles, vec![article()]);
    }

    #[test]
    fn test_invalid_url() {
        assert!(SupabaseStorage::new(BackendConfig::new("not a url", "k")).is_err());
    }
}
