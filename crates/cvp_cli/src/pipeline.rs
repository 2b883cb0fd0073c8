use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use cvp_core::{Article, ArticleStorage};
use cvp_crawler::{CrawlResult, CvprCrawler};
use cvp_inference::{EmbeddingJobResult, EmbeddingService};
use cvp_storage::upsert_articles_chunked;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub upsert_requested: bool,
    pub batch_size: usize,
    pub embedding_failure_log: Option<PathBuf>,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub crawl: CrawlResult,
    pub embedding: Option<EmbeddingJobResult>,
    pub upserted: usize,
}

/// Crawl, then embed and store whatever was harvested. Only a storage
/// failure is an error; everything else is reported.
pub async fn run_pipeline(
    crawler: &CvprCrawler,
    embedding_service: Option<&EmbeddingService>,
    storage: Option<&dyn ArticleStorage>,
    options: &PipelineOptions,
) -> anyhow::Result<PipelineReport> {
    let config = crawler.config();
    info!("Starting crawl (years={:?}, limit={:?})", config.years, config.limit);
    let mut crawl = crawler.crawl().await;
    info!("Crawl finished: {}", crawl.summary());

    let sample_titles: Vec<&str> = crawl.articles.iter().take(3).map(|a| a.title.as_str()).collect();
    if !sample_titles.is_empty() {
        info!("Sample titles: {:?}", sample_titles);
    }

    let mut embedding = None;
    let mut to_upsert: Vec<Article> = crawl.articles.clone();
    if let Some(service) = embedding_service.filter(|_| !crawl.articles.is_empty()) {
        info!("Generating embeddings with {} (one chunk per abstract)", service.model_name());
        let result = service
            .embed_articles(&mut crawl.articles, options.embedding_failure_log.as_deref())
            .await;
        info!("Embedding finished: processed={}, failed={}", result.processed, result.failed.len());
        if !result.failed.is_empty() {
            match &options.embedding_failure_log {
                Some(path) => warn!("Some articles were not embedded, see {}", path.display()),
                None => warn!("Some articles were not embedded and the failure log is disabled"),
            }
        }
        to_upsert = crawl.articles.iter().filter(|a| a.embedding.is_some()).cloned().collect();
        embedding = Some(result);
    }

    let mut upserted = 0;
    match storage {
        Some(storage) if !to_upsert.is_empty() => {
            upsert_articles_chunked(storage, &to_upsert, options.batch_size)
                .await
                .context("Supabase upsert failed")?;
            upserted = to_upsert.len();
            info!("Upsert finished: inserted_or_updated={}", upserted);
        }
        _ if options.upsert_requested && to_upsert.is_empty() => {
            warn!("Nothing to upsert (embedding may have failed)");
        }
        _ => {}
    }

    Ok(PipelineReport { crawl, embedding, upserted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use cvp_core::{EmbeddingModel, Error, Result};
    use cvp_crawler::CrawlerConfig;
    use cvp_inference::models::DummyModel;
    use cvp_storage::MemoryStorage;
    use mockito::{Matcher, Server, ServerGuard};

    struct FailingModel;

    #[async_trait]
    impl EmbeddingModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate_embeddings(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::Inference("offline".to_string()))
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl ArticleStorage for BrokenStorage {
        async fn upsert_articles(&self, _articles: &[Article]) -> Result<()> {
            Err(Error::Storage("table missing".to_string()))
        }

        async fn list_articles(&self, _limit: usize) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }
    }

    async fn archive() -> ServerGuard {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/CVPR2024")
            .match_query(Matcher::Any)
            .with_body(
                r#"<dl>
                    <dt class="ptitle"><a href="/a.html">Paper A</a></dt>
                    <dt class="ptitle"><a href="/b.html">Paper B</a></dt>
                </dl>"#,
            )
            .create_async()
            .await;
        for path in ["/a.html", "/b.html"] {
            server
                .mock("GET", path)
                .with_body(r#"<div id="authors">Jane Doe; Proceedings</div><div id="abstract">Text.</div>"#)
                .create_async()
                .await;
        }
        server
    }

    fn crawler(server: &ServerGuard) -> CvprCrawler {
        CvprCrawler::new(CrawlerConfig::default().with_base_url(&server.url()).with_years([2024])).unwrap()
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            upsert_requested: true,
            batch_size: 1,
            embedding_failure_log: None,
        }
    }

    #[tokio::test]
    async fn test_pipeline_embeds_and_upserts() {
        let server = archive().await;
        let service = EmbeddingService::new(Arc::new(DummyModel::new()));
        let storage = MemoryStorage::new();

        let report = run_pipeline(&crawler(&server), Some(&service), Some(&storage), &options())
            .await
            .unwrap();

        assert_eq!(report.crawl.articles.len(), 2);
        assert_eq!(report.embedding.unwrap().processed, 2);
        assert_eq!(report.upserted, 2);
        assert_eq!(storage.len().await, 2);
        assert_eq!(storage.upsert_calls().await, 2);
        let stored = storage.list_articles(10).await.unwrap();
        assert!(stored.iter().all(|a| a.embedding.is_some()));
    }

    #[tokio::test]
    async fn test_unembedded_articles_are_not_upserted() {
        let server = archive().await;
        let service = EmbeddingService::new(Arc::new(FailingModel));
        let storage = MemoryStorage::new();

        let report = run_pipeline(&crawler(&server), Some(&service), Some(&storage), &options())
            .await
            .unwrap();

        assert_eq!(report.embedding.unwrap().failed.len(), 2);
        assert_eq!(report.upserted, 0);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_storage_failure_is_an_error() {
        let server = archive().await;
        let service = EmbeddingService::new(Arc::new(DummyModel::new()));

        let result = run_pipeline(&crawler(&server), Some(&service), Some(&BrokenStorage), &options()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_crawl_only() {
        let server = archive().await;
        let options = PipelineOptions { upsert_requested: false, ..options() };

        let report = run_pipeline(&crawler(&server), None, None, &options).await.unwrap();
        assert_eq!(report.crawl.articles.len(), 2);
        assert!(report.embedding.is_none());
        assert_eq!(report.upserted, 0);
    }
}
