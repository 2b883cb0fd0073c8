use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cvp_core::{Article, ArticleStorage, Error, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        authors TEXT NOT NULL,
        year TEXT NOT NULL,
        abstract TEXT NOT NULL,
        abstract_embedding TEXT
    )
    "#,
];

/// Local alternative to Supabase. Embeddings are stored as JSON text.
pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

fn storage_error(action: &str, e: impl std::fmt::Display) -> Error {
    Error::Storage(format!("Failed to {}: {}", action, e))
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_error("connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("run migration {}", i), e))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl ArticleStorage for SqliteStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<()> {
        if articles.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| storage_error("begin transaction", e))?;
        for article in articles {
            let embedding = article.embedding.as_ref().map(serde_json::to_string).transpose()?;
            sqlx::query(
                r#"
                INSERT INTO articles (url, title, authors, year, abstract, abstract_embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    authors = excluded.authors,
                    year = excluded.year,
                    abstract = excluded.abstract,
                    abstract_embedding = excluded.abstract_embedding
                "#,
            )
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.authors)
            .bind(&article.year)
            .bind(&article.abstract_text)
            .bind(embedding)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("upsert article", e))?;
        }
        tx.commit().await.map_err(|e| storage_error("commit", e))?;
        Ok(())
    }

    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY rowid LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| storage_error("list articles", e))?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding: Option<String> = row.get("abstract_embedding");
            articles.push(Article {
                url: row.get("url"),
                title: row.get("title"),
                authors: row.get("authors"),
                year: row.get("year"),
                abstract_text: row.get("abstract"),
                embedding: embedding.map(|e| serde_json::from_str(&e)).transpose()?,
            });
        }
        Ok(articles)
    }
}
