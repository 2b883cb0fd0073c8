use async_trait::async_trait;
use crate::Result;

/// A text embedding backend used to annotate harvested articles.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn name(&self) -> &str;

    /// Generate an embedding vector for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;
}
