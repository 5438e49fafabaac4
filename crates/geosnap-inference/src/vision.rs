//! Multimodal vectorization backend speaking the Azure AI Vision
//! retrieval API.
//!
//! Image bytes go to `retrieval:vectorizeImage` as an octet-stream; text
//! queries go to `retrieval:vectorizeText` as JSON. Both return a vector
//! in the same embedding space, which is what makes text-to-image
//! retrieval work.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use geosnap_core::{Error, Result};

use crate::backend::EmbeddingBackend;
use crate::config::VisionConfig;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Embedding backend backed by an Azure AI Vision deployment.
pub struct VisionEmbeddingBackend {
    endpoint: String,
    api_key: String,
    api_version: String,
    model_version: String,
    dimension: usize,
    timeout: Duration,
    max_image_bytes: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct VectorizeTextRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct VectorizeResponse {
    vector: Vec<f32>,
}

impl VisionEmbeddingBackend {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            api_version: config.api_version,
            model_version: config.model_version,
            dimension: config.dimension,
            timeout: Duration::from_secs(config.timeout_secs),
            max_image_bytes: config.max_image_bytes,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/computervision/retrieval:{}?api-version={}&model-version={}",
            self.endpoint, operation, self.api_version, self.model_version
        )
    }

    async fn parse_vector(&self, response: reqwest::Response) -> Result<Vector> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Vision service returned {}: {}",
                status, body
            )));
        }

        let result: VectorizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.vector.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "Vision service returned {}-dimensional vector, expected {}",
                result.vector.len(),
                self.dimension
            )));
        }

        Ok(Vector::from(result.vector))
    }

    fn log_timing(&self, op: &str, start: Instant) {
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            subsystem = "inference",
            component = "vision",
            op = op,
            duration_ms = elapsed,
            "Vectorization complete"
        );
        if elapsed > 5000 {
            warn!(
                subsystem = "inference",
                component = "vision",
                op = op,
                duration_ms = elapsed,
                slow = true,
                "Slow vectorization request"
            );
        }
    }
}

#[async_trait]
impl EmbeddingBackend for VisionEmbeddingBackend {
    #[instrument(skip(self, image_data), fields(subsystem = "inference", component = "vision", op = "embed_image", byte_count = image_data.len()))]
    async fn embed_image(&self, image_data: &[u8]) -> Result<Vector> {
        let start = Instant::now();

        // The service rejects oversized payloads anyway; failing here
        // gives the caller an actionable error without a round trip.
        if image_data.len() > self.max_image_bytes {
            return Err(Error::InvalidInput(format!(
                "image payload is {} bytes, vision service accepts at most {}",
                image_data.len(),
                self.max_image_bytes
            )));
        }

        let response = self
            .client
            .post(self.url("vectorizeImage"))
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .timeout(self.timeout)
            .body(image_data.to_vec())
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Image vectorization request failed: {}", e)))?;

        let vector = self.parse_vector(response).await?;
        self.log_timing("embed_image", start);
        Ok(vector)
    }

    #[instrument(skip(self, text), fields(subsystem = "inference", component = "vision", op = "embed_text"))]
    async fn embed_text(&self, text: &str) -> Result<Vector> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.url("vectorizeText"))
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(&VectorizeTextRequest { text })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Text vectorization request failed: {}", e)))?;

        let vector = self.parse_vector(response).await?;
        self.log_timing("embed_text", start);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_version
    }
}
