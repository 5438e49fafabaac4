//! Repository traits the storage layer implements.
//!
//! These four operations (content-hash lookup, atomic image+embedding
//! store, point-in-radius filter, per-row cosine ranking) plus the
//! history query are the entire surface this core requires from storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::history::HistoryEntry;
use crate::models::{NewHistoryEntry, SimilarityResult};

/// Request to store a newly ingested image.
#[derive(Debug, Clone)]
pub struct StoreImageRequest {
    /// Caller-facing reference (original path or upload name).
    pub reference: String,
    /// SHA-256 digest of the image bytes, hex-encoded.
    pub content_hash: String,
    pub account_name: String,
    pub account_source: String,
    pub session_id: String,
    pub device_make: Option<String>,
    pub device_model: Option<String>,
    pub location: Option<GeoPoint>,
    pub taken_at: DateTime<Utc>,
    pub focal_length_35mm: Option<i32>,
    pub orientation_degrees: Option<f64>,
    pub metadata: JsonValue,
}

/// Outcome of a store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredImageId {
    pub id: Uuid,
    /// True when the content hash already existed and no rows were
    /// written (idempotent re-ingest).
    pub deduplicated: bool,
}

/// Repository for image records and their embeddings.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Look up an image id by its content hash.
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Uuid>>;

    /// Store an image and its embedding as one atomic unit, upserting the
    /// owning account/session/device. Re-ingesting an already-stored
    /// content hash returns the existing id without writing.
    async fn store(&self, req: StoreImageRequest, embedding: Vector) -> Result<StoredImageId>;

    /// Ids of every stored image within `radius_m` meters of `point`,
    /// under geodesic distance.
    async fn ids_within_radius(&self, point: &GeoPoint, radius_m: f64) -> Result<Vec<Uuid>>;

    /// Rank the given images by cosine similarity against `query`,
    /// discarding scores below `threshold`, descending, ties broken by
    /// ascending id, truncated to `limit`.
    async fn rank_by_similarity(
        &self,
        ids: &[Uuid],
        query: &Vector,
        threshold: f32,
        limit: i64,
    ) -> Result<Vec<SimilarityResult>>;
}

/// Repository for the append-only interaction history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append one history entry.
    async fn append(&self, entry: NewHistoryEntry) -> Result<Uuid>;

    /// Prior interactions for a (session, account) pair, most-recent
    /// first. `lookback_hours == 0` scans the entire history; otherwise
    /// only entries with `occurred_at >= now - lookback_hours`.
    async fn recent(
        &self,
        session_id: &str,
        account_name: &str,
        lookback_hours: i64,
    ) -> Result<Vec<HistoryEntry>>;

    /// Same as [`Self::recent`] with an explicit "now", for deterministic
    /// horizon tests.
    async fn recent_as_of(
        &self,
        session_id: &str,
        account_name: &str,
        lookback_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>>;
}
