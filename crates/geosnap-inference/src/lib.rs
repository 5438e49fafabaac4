//! # geosnap-inference
//!
//! Multimodal embedding backend abstraction for geosnap.
//!
//! Image bytes and text queries are vectorized into one shared embedding
//! space by a remote vision service, so retrieval can rank stored image
//! vectors against either kind of query.
//!
//! - [`EmbeddingBackend`]: the trait the pipeline and retrieval depend on
//! - [`VisionEmbeddingBackend`]: Azure AI Vision retrieval API client
//! - [`MockEmbeddingBackend`]: deterministic in-process mock for tests

pub mod backend;
pub mod config;
pub mod mock;
pub mod vision;

pub use backend::EmbeddingBackend;
pub use config::{ConfigError, VisionConfig};
pub use mock::MockEmbeddingBackend;
pub use vision::VisionEmbeddingBackend;
