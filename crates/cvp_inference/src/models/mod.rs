use std::sync::Arc;

use tracing::warn;

use cvp_core::{EmbeddingModel, Result};

use crate::Config;

pub mod dummy;
pub mod http;

pub use dummy::DummyModel;
pub use http::HttpEmbeddingModel;

const MODEL_ALIASES: &[(&str, &str)] = &[
    ("multilingual-e5-large", "intfloat/multilingual-e5-large"),
    ("sentence-transformers/multilingual-e5-large", "intfloat/multilingual-e5-large"),
];

/// Maps shorthand or outdated model names to the canonical one.
pub fn resolve_model_name(model_name: &str) -> &str {
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == model_name)
        .map(|(_, resolved)| *resolved)
        .unwrap_or(model_name)
}

/// Builds the embedding model described by `config`. The name `dummy` selects
/// the offline model.
pub fn create_model(config: &Config) -> Result<Arc<dyn EmbeddingModel>> {
    config.validate()?;
    if config.model_name == "dummy" {
        return Ok(Arc::new(DummyModel::new()));
    }

    let resolved = resolve_model_name(&config.model_name);
    if resolved != config.model_name {
        warn!("Embedding model {} replaced by {}", config.model_name, resolved);
    }
    let config = Config {
        model_name: resolved.to_string(),
        ..config.clone()
    };
    Ok(Arc::new(HttpEmbeddingModel::new(&config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_name() {
        assert_eq!(resolve_model_name("multilingual-e5-large"), "intfloat/multilingual-e5-large");
        assert_eq!(
            resolve_model_name("sentence-transformers/multilingual-e5-large"),
            "intfloat/multilingual-e5-large"
        );
        assert_eq!(resolve_model_name("intfloat/e5-small"), "intfloat/e5-small");
    }

    #[test]
    fn test_create_model() {
        let dummy = create_model(&Config { model_name: "dummy".to_string(), ..Config::default() }).unwrap();
        assert_eq!(dummy.name(), "Dummy");

        let http = create_model(&Config { model_name: "multilingual-e5-large".to_string(), ..Config::default() }).unwrap();
        assert_eq!(http.name(), "intfloat/multilingual-e5-large");
    }
}
