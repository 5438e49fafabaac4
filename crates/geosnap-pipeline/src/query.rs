//! Query-side glue: embed the caller's query, then run retrieval.

use std::sync::Arc;

use tracing::instrument;

use geosnap_core::{GeoPoint, ImageSource, Result, SimilarityResult};
use geosnap_inference::EmbeddingBackend;
use geosnap_search::{RetrievalConfig, RetrievalEngine, RetrievalRequest};

/// Finds stored images near a location that match a text or image query.
pub struct QueryService {
    backend: Arc<dyn EmbeddingBackend>,
    engine: RetrievalEngine,
}

impl QueryService {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, engine: RetrievalEngine) -> Self {
        Self { backend, engine }
    }

    /// Search with a free-text query ("red bicycle leaning on a wall").
    #[instrument(skip(self, text, config), fields(subsystem = "pipeline", component = "query", op = "search_text"))]
    pub async fn search_by_text(
        &self,
        text: &str,
        location: Option<GeoPoint>,
        config: RetrievalConfig,
    ) -> Result<Vec<SimilarityResult>> {
        let embedding = self.backend.embed_text(text).await?;
        self.engine
            .search(&RetrievalRequest::new(location, embedding).with_config(config))
            .await
    }

    /// Search with an example image.
    #[instrument(skip(self, source, config), fields(subsystem = "pipeline", component = "query", op = "search_image"))]
    pub async fn search_by_image(
        &self,
        source: &ImageSource,
        location: Option<GeoPoint>,
        config: RetrievalConfig,
    ) -> Result<Vec<SimilarityResult>> {
        let bytes = source.resolve()?;
        let embedding = self.backend.embed_image(&bytes).await?;
        self.engine
            .search(&RetrievalRequest::new(location, embedding).with_config(config))
            .await
    }
}
