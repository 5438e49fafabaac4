//! # geosnap-pipeline
//!
//! Ingestion and query orchestration for geosnap.
//!
//! [`ImageIngestor`] runs the full ingestion chain (content hash →
//! metadata extraction → timestamp localization → location synthesis →
//! embedding → atomic persistence → history append) over the storage and
//! embedding abstractions; [`QueryService`] glues query embedding to the
//! two-stage retrieval engine.

pub mod config;
pub mod ingest;
pub mod query;

pub use config::PipelineConfig;
pub use ingest::{ImageIngestor, IngestOutcome, IngestReport, IngestRequest};
pub use query::QueryService;
