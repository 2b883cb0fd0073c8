use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use cvp_core::{Article, EmbeddingModel, Error, Result};

/// The e5 family expects passages to be prefixed.
pub const PASSAGE_PREFIX: &str = "passage: ";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingFailure {
    pub title: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct EmbeddingJobResult {
    pub processed: usize,
    pub failed: Vec<EmbeddingFailure>,
}

impl EmbeddingJobResult {
    pub fn record_failure(&mut self, article: &Article, error: &Error) {
        self.failed.push(EmbeddingFailure {
            title: article.title.clone(),
            url: article.url.clone(),
            error: error.to_string(),
        });
    }

    /// Writes `{"failures": [...]}` to `path`. Nothing is written when every
    /// article was embedded.
    pub fn dump_failures(&self, path: &Path) -> Result<()> {
        if self.failed.is_empty() {
            return Ok(());
        }
        #[derive(Serialize)]
        struct FailureLog<'a> {
            failures: &'a [EmbeddingFailure],
        }
        let data = serde_json::to_string_pretty(&FailureLog { failures: &self.failed })?;
        std::fs::write(path, data)?;
        warn!("Embedding failures written to {}", path.display());
        Ok(())
    }
}

/// Annotates articles with abstract embeddings, one abstract per request.
pub struct EmbeddingService {
    model: Arc<dyn EmbeddingModel>,
}

impl EmbeddingService {
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Failures are recorded per article and never abort the job.
    pub async fn embed_articles(&self, articles: &mut [Article], failure_log: Option<&Path>) -> EmbeddingJobResult {
        let mut result = EmbeddingJobResult::default();
        if articles.is_empty() {
            return result;
        }

        let total = articles.len();
        for (index, article) in articles.iter_mut().enumerate() {
            let text = format!("{}{}", PASSAGE_PREFIX, article.abstract_text);
            match self.model.generate_embeddings(&text).await {
                Ok(vector) if vector.is_empty() => {
                    error!("Unexpected embedding format for {}/{}: empty vector", index + 1, total);
                    result.record_failure(article, &Error::Inference("invalid embedding format".to_string()));
                }
                Ok(vector) => {
                    article.embedding = Some(vector);
                    result.processed += 1;
                }
                Err(e) => {
                    error!("Embedding failed for {}/{}: {}", index + 1, total, e);
                    result.record_failure(article, &e);
                }
            }
        }
        info!("Embedded {}/{} abstracts with {}", result.processed, total, self.model.name());

        if let Some(path) = failure_log {
            if let Err(e) = result.dump_failures(path) {
                error!("Could not write embedding failure log {}: {}", path.display(), e);
            }
        }

        result
    }
}
