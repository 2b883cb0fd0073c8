use async_trait::async_trait;
use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert or update articles, resolving conflicts on `url`
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()>;

    /// Fetch up to `limit` stored articles, mostly useful as a health check
    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>>;
}
