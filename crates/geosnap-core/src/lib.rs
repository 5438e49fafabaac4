//! # geosnap-core
//!
//! Core types, traits, and algorithms for the geosnap library.
//!
//! This crate provides the capture-metadata extraction, timezone
//! resolution, and location synthesis that the other geosnap crates
//! build on, plus the repository traits the storage layer implements.

pub mod defaults;
pub mod error;
pub mod exif;
pub mod geo;
pub mod history;
pub mod location;
pub mod logging;
pub mod models;
pub mod timezone;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use exif::{extract_from_source, extract_metadata, CapturedMetadata, ImageSource};
pub use geo::GeoPoint;
pub use history::{recover_location, HistoryEntry, RecoveredLocation};
pub use location::{CandidateOrigin, CandidateSet, LocationCandidate, Precision};
pub use models::*;
pub use timezone::{localize_capture_time, resolve_timezone};
pub use traits::{HistoryRepository, ImageRepository, StoreImageRequest, StoredImageId};
