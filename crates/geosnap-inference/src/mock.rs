//! Mock embedding backend for deterministic testing.
//!
//! Generates stable vectors from a hash of the input, so the same bytes
//! or text always embed to the same vector across runs, with optional
//! failure injection for error-path tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geosnap_inference::mock::MockEmbeddingBackend;
//!
//! #[tokio::test]
//! async fn test_with_mock_backend() {
//!     let backend = MockEmbeddingBackend::new().with_dimension(8);
//!
//!     let embedding = backend.embed_text("test text").await.unwrap();
//!     assert_eq!(embedding.as_slice().len(), 8);
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pgvector::Vector;

use geosnap_core::{Error, Result};

use crate::backend::EmbeddingBackend;

/// Mock embedding backend for testing.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    fixed_vectors: HashMap<String, Vec<f32>>,
    failure: Option<String>,
}

/// One recorded call, for assertions.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    /// Text input, or a `bytes:<len>` marker for image calls.
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 8,
            fixed_vectors: HashMap::new(),
            failure: None,
        }
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Pin the vector returned for a specific text input.
    pub fn with_fixed_vector(mut self, input: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_vectors
            .insert(input.into(), vector);
        self
    }

    /// Make every embed call fail with the given message.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(message.into());
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Get number of image embed calls.
    pub fn image_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "embed_image")
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    /// Deterministic vector from a hash seed, normalized to unit length.
    fn generate(&self, seed: u64) -> Vector {
        let mut state = seed | 1;
        let mut values = Vec::with_capacity(self.config.dimension);
        for _ in 0..self.config.dimension {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            values.push((state as f32 / u64::MAX as f32) - 0.5);
        }
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }
        Vector::from(values)
    }

    fn check_failure(&self) -> Result<()> {
        match &self.config.failure {
            Some(message) => Err(Error::Embedding(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_image(&self, image_data: &[u8]) -> Result<Vector> {
        self.log_call("embed_image", &format!("bytes:{}", image_data.len()));
        self.check_failure()?;

        let mut hasher = DefaultHasher::new();
        image_data.hash(&mut hasher);
        Ok(self.generate(hasher.finish()))
    }

    async fn embed_text(&self, text: &str) -> Result<Vector> {
        self.log_call("embed_text", text);
        self.check_failure()?;

        if let Some(fixed) = self.config.fixed_vectors.get(text) {
            return Ok(Vector::from(fixed.clone()));
        }

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        Ok(self.generate(hasher.finish()))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
