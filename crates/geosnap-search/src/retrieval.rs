//! Two-stage retrieval: geodesic radius filter, then cosine ranking.
//!
//! Stage A narrows the corpus to images within a radius of the query
//! location; Stage B ranks only those survivors by cosine similarity
//! against the query embedding. Similarity is never computed for images
//! outside the radius, and an absent query location short-circuits to an
//! empty result rather than falling back to a global scan.

use std::sync::Arc;
use std::time::Instant;

use pgvector::Vector;
use tracing::{debug, info, instrument};

use geosnap_core::defaults::{
    DEFAULT_RADIUS_METERS, DEFAULT_RESULT_LIMIT, DEFAULT_SIMILARITY_THRESHOLD,
};
use geosnap_core::{Error, GeoPoint, ImageRepository, Result, SimilarityResult};

/// Configuration for a retrieval call.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Stage-A radius in meters.
    pub radius_m: f64,
    /// Stage-B minimum cosine similarity; lower scores are discarded.
    pub threshold: f32,
    /// Maximum number of results.
    pub limit: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_METERS,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl RetrievalConfig {
    /// Set the spatial radius in meters.
    pub fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Set the minimum similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

/// One retrieval query: where the caller is, and what they look for.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    /// Query location. Absent means no spatial anchor exists, which
    /// yields an empty result by contract.
    pub location: Option<GeoPoint>,
    /// Query embedding, in the corpus embedding space.
    pub embedding: Vector,
    pub config: RetrievalConfig,
}

impl RetrievalRequest {
    pub fn new(location: Option<GeoPoint>, embedding: Vector) -> Self {
        Self {
            location,
            embedding,
            config: RetrievalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }
}

/// Two-stage retrieval engine over an image repository.
pub struct RetrievalEngine {
    images: Arc<dyn ImageRepository>,
    /// Dimension every stored and query embedding must have.
    dimension: usize,
}

impl RetrievalEngine {
    pub fn new(images: Arc<dyn ImageRepository>, dimension: usize) -> Self {
        Self { images, dimension }
    }

    /// Reject malformed parameters before touching storage.
    fn validate(&self, request: &RetrievalRequest) -> Result<()> {
        let got = request.embedding.as_slice().len();
        if got != self.dimension {
            return Err(Error::InvalidInput(format!(
                "query embedding has dimension {}, corpus uses {}",
                got, self.dimension
            )));
        }
        if let Some(point) = &request.location {
            point.validate()?;
        }
        let config = &request.config;
        if !config.radius_m.is_finite() || config.radius_m <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "radius must be positive and finite, got {}",
                config.radius_m
            )));
        }
        if !config.threshold.is_finite() {
            return Err(Error::InvalidInput("threshold must be finite".to_string()));
        }
        if config.limit < 1 {
            return Err(Error::InvalidInput(format!(
                "limit must be at least 1, got {}",
                config.limit
            )));
        }
        Ok(())
    }

    /// Run the full two-stage retrieval.
    ///
    /// Deterministic for a fixed store state and fixed parameters: the
    /// ranking orders by similarity descending with ascending id as the
    /// tie-break.
    #[instrument(skip(self, request), fields(subsystem = "search", component = "retrieval", op = "search"))]
    pub async fn search(&self, request: &RetrievalRequest) -> Result<Vec<SimilarityResult>> {
        self.validate(request)?;
        let start = Instant::now();
        let config = &request.config;

        let Some(location) = &request.location else {
            debug!(
                subsystem = "search",
                component = "retrieval",
                "No query location, returning empty result"
            );
            return Ok(Vec::new());
        };

        let candidate_ids = self
            .images
            .ids_within_radius(location, config.radius_m)
            .await?;

        debug!(
            subsystem = "search",
            component = "retrieval",
            radius_m = config.radius_m,
            spatial_hits = candidate_ids.len(),
            "Stage A complete"
        );

        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = self
            .images
            .rank_by_similarity(
                &candidate_ids,
                &request.embedding,
                config.threshold,
                config.limit,
            )
            .await?;

        info!(
            subsystem = "search",
            component = "retrieval",
            op = "search",
            radius_m = config.radius_m,
            threshold = config.threshold,
            limit = config.limit,
            spatial_hits = candidate_ids.len(),
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Retrieval complete"
        );

        Ok(results)
    }
}
