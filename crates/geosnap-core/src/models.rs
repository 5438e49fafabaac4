//! Shared record types crossing the core/storage boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::geo::GeoPoint;

/// One retrieval result. Produced only as retrieval output, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub id: Uuid,
    /// Caller-facing reference (original path or upload name).
    pub reference: String,
    pub location: Option<GeoPoint>,
    /// Cosine similarity against the query embedding, in [-1, 1].
    pub similarity: f32,
    /// Capture metadata preserved as JSON (make, model, altitude).
    pub metadata: JsonValue,
}

/// A history entry to append after an ingestion or chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub session_id: String,
    pub account_name: String,
    pub account_source: String,
    pub image_id: Option<Uuid>,
    pub location: Option<GeoPoint>,
    pub prompt: Option<String>,
}
