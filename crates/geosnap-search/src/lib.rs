//! # geosnap-search
//!
//! Two-stage retrieval engine for geosnap.
//!
//! Stage A filters the corpus to images within a geodesic radius of the
//! query location; Stage B ranks the survivors by cosine similarity
//! against the query embedding. Both stages run through the
//! [`geosnap_core::ImageRepository`] trait, so the engine is storage
//! agnostic and unit-testable without a database.

pub mod retrieval;

pub use retrieval::{RetrievalConfig, RetrievalEngine, RetrievalRequest};
