use std::sync::Arc;

use tracing::debug;

use cvp_core::{Article, ArticleStorage, Error, Result};

pub mod backends;
pub mod retry;

pub use backends::*;
pub use retry::RetryPolicy;

pub const DEFAULT_TABLE: &str = "Articles";
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Connection settings shared by the remote backends.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

/// Splits `items` into consecutive chunks of at most `size` elements.
pub fn chunked<T>(items: &[T], size: usize) -> Result<std::slice::Chunks<'_, T>> {
    if size == 0 {
        return Err(Error::Storage("batch_size must be positive".to_string()));
    }
    Ok(items.chunks(size))
}

/// Upserts in batches so a single request stays under the payload limit.
/// Stops at the first batch that fails.
pub async fn upsert_articles_chunked(
    storage: &dyn ArticleStorage,
    articles: &[Article],
    batch_size: usize,
) -> Result<()> {
    for (index, chunk) in chunked(articles, batch_size)?.enumerate() {
        debug!("Upserting batch {} (size={})", index + 1, chunk.len());
        storage.upsert_articles(chunk).await?;
    }
    Ok(())
}

/// Builds a storage backend by name: `supabase`, `memory` or (with the
/// `sqlite` feature) `sqlite`, in which case `config.url` is the database path.
pub async fn create_storage(backend: &str, config: &BackendConfig) -> Result<Arc<dyn ArticleStorage>> {
    match backend {
        "supabase" => Ok(Arc::new(SupabaseStorage::new(config.clone())?)),
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SqliteStorage::new_with_path(std::path::Path::new(&config.url)).await?)),
        other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::{create_storage, upsert_articles_chunked, BackendConfig};
    pub use super::backends::*;
}
