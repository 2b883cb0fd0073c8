use std::collections::HashMap;
use std::fmt;

use cvp_core::{EmbeddingModel, Result};

pub const DUMMY_DIMENSIONS: usize = 768;

/// Deterministic embeddings computed from character statistics. Only good
/// for offline runs and tests.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmbeddingModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; DUMMY_DIMENSIONS];
        if text.is_empty() {
            return Ok(embedding);
        }

        let text_len = text.chars().count() as f32;
        embedding[0] = text_len / 1000.0;

        let mut char_freq: HashMap<char, usize> = HashMap::new();
        for c in text.chars() {
            *char_freq.entry(c).or_insert(0) += 1;
        }

        // bucket by code point so the same text always maps to the same vector
        for (c, count) in char_freq {
            let slot = 1 + (c as u32 as usize) % (DUMMY_DIMENSIONS - 1);
            embedding[slot] += count as f32 / text_len;
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();

        let embedding = model.generate_embeddings("passage: Test text").await.unwrap();
        assert_eq!(embedding.len(), DUMMY_DIMENSIONS);
        assert!(embedding[0] > 0.0);

        let again = model.generate_embeddings("passage: Test text").await.unwrap();
        assert_eq!(embedding, again);

        let other = model.generate_embeddings("something else").await.unwrap();
        assert_ne!(embedding, other);
    }
}
