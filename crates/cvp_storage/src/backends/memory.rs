use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use cvp_core::{Article, ArticleStorage, Result};

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    upsert_calls: usize,
}

impl MemoryStore {
    pub fn upsert_articles(&mut self, articles: &[Article]) {
        self.upsert_calls += 1;
        for article in articles {
            if let Some(existing) = self.articles.iter_mut().find(|a| a.url == article.url) {
                *existing = article.clone();
            } else {
                self.articles.push(article.clone());
            }
        }
    }

    pub fn list_articles(&self, limit: usize) -> Vec<Article> {
        self.articles.iter().take(limit).cloned().collect()
    }
}

/// In-process storage keyed by url. Used for dry runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.articles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of upsert requests received, one per batch.
    pub async fn upsert_calls(&self) -> usize {
        self.store.read().await.upsert_calls
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()> {
        if articles.is_empty() {
            return Ok(());
        }
        let mut store = self.store.write().await;
        store.upsert_articles(articles);
        Ok(())
    }

    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_articles(limit))
    }
}
