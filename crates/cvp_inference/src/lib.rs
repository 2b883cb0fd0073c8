use cvp_core::{Error, Result};
use url::Url;

pub mod models;
pub mod embeddings;

pub const DEFAULT_MODEL_NAME: &str = "intfloat/multilingual-e5-large";
pub const DEFAULT_API_URL: &str = "http://localhost:8080/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: String,
    /// Base URL of an OpenAI-compatible embeddings API.
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(Error::Config("embedding model name is empty".to_string()));
        }
        Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("invalid embedding API URL {}: {}", self.api_url, e)))?;
        Ok(())
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::embeddings::{EmbeddingJobResult, EmbeddingService};
    pub use super::models::create_model;
    pub use cvp_core::{Article, EmbeddingModel, Error, Result};
}

pub use embeddings::{EmbeddingFailure, EmbeddingJobResult, EmbeddingService};
pub use models::create_model;
