//! Embedding backend trait.

use async_trait::async_trait;
use pgvector::Vector;

use geosnap_core::Result;

/// Backend producing image and text embeddings in one shared vector
/// space, so a text query can be ranked against stored image vectors.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed raw image bytes.
    async fn embed_image(&self, image_data: &[u8]) -> Result<Vector>;

    /// Embed a text query into the same space as [`Self::embed_image`].
    async fn embed_text(&self, text: &str) -> Result<Vector>;

    /// Dimension of the vectors this backend produces.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
