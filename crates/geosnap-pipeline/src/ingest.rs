//! Ingestion orchestration.
//!
//! One ingest call runs the full chain: resolve bytes, content-hash,
//! extract capture metadata, localize the capture timestamp, synthesize
//! the most credible location from every available source, embed, and
//! persist atomically with a history entry appended after the store.
//!
//! Embedding failures abort the item before anything is written, so a
//! stored image always has a stored vector.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use geosnap_core::{
    extract_metadata, localize_capture_time, recover_location, CandidateSet, Error, GeoPoint,
    HistoryRepository, ImageRepository, ImageSource, NewHistoryEntry, Precision, Result,
    StoreImageRequest,
};
use geosnap_inference::EmbeddingBackend;

use crate::config::PipelineConfig;

/// One image to ingest, with everything the caller knows about it.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub source: ImageSource,
    /// Caller-facing reference (original path or upload name).
    pub reference: String,
    pub account_name: String,
    pub account_source: String,
    pub session_id: String,
    /// Location the caller stated outright ("I am at ..."), trusted over
    /// anything but an EXIF GPS fix.
    pub described_accurate: Option<GeoPoint>,
    /// Location inferred loosely from the caller's description.
    pub described_rough: Option<GeoPoint>,
    /// Prompt text accompanying the upload, kept in history.
    pub prompt: Option<String>,
}

/// Outcome of a single successful ingest.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub image_id: Uuid,
    /// True when the content hash already existed and the stored record
    /// was reused.
    pub deduplicated: bool,
    /// The synthesized location that was persisted, if any source won.
    pub location: Option<GeoPoint>,
    /// Set when the image carried corrupt metadata (ingest continued).
    pub metadata_parse_error: Option<String>,
}

/// Per-item result of a batch ingest.
#[derive(Debug)]
pub struct IngestReport {
    pub reference: String,
    pub outcome: Result<IngestOutcome>,
}

/// Orchestrates the ingestion chain over the storage and embedding
/// abstractions.
pub struct ImageIngestor {
    images: Arc<dyn ImageRepository>,
    history: Arc<dyn HistoryRepository>,
    backend: Arc<dyn EmbeddingBackend>,
    config: PipelineConfig,
}

impl ImageIngestor {
    pub fn new(
        images: Arc<dyn ImageRepository>,
        history: Arc<dyn HistoryRepository>,
        backend: Arc<dyn EmbeddingBackend>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            images,
            history,
            backend,
            config,
        }
    }

    /// Ingest one image end to end.
    #[instrument(skip(self, request), fields(subsystem = "pipeline", component = "ingest", op = "ingest", session_id = %request.session_id, account = %request.account_name))]
    pub async fn ingest_image(&self, request: &IngestRequest) -> Result<IngestOutcome> {
        let start = Instant::now();

        let bytes = request.source.resolve()?;
        let content_hash = hex::encode(Sha256::digest(bytes.as_ref()));
        let content_type = infer::get(&bytes).map(|t| t.mime_type());

        let metadata = extract_metadata(&bytes);
        if let Some(parse_error) = &metadata.parse_error {
            warn!(
                subsystem = "pipeline",
                component = "ingest",
                error = %parse_error,
                "Image metadata unreadable, ingesting without it"
            );
        }

        let taken_at = metadata
            .captured_at
            .as_deref()
            .and_then(|raw| {
                localize_capture_time(raw, metadata.timezone, self.config.default_timezone)
            })
            .unwrap_or_else(Utc::now);

        let entries = self
            .history
            .recent(
                &request.session_id,
                &request.account_name,
                self.config.lookback_hours,
            )
            .await?;
        let recovered = recover_location(&entries);
        let (history_accurate, history_rough) = match recovered {
            Some(r) if r.precision == Precision::Accurate => (Some(r.point), None),
            Some(r) => (None, Some(r.point)),
            None => (None, None),
        };

        let location = CandidateSet::new()
            .with_exif(metadata.location)
            .with_description(request.described_accurate, request.described_rough)
            .with_history(history_accurate, history_rough)
            .synthesize();

        debug!(
            subsystem = "pipeline",
            component = "ingest",
            exif_fix = metadata.location.is_some(),
            history_entries = entries.len(),
            resolved = location.is_some(),
            "Location synthesis complete"
        );

        // Embed before writing anything: a stored image without a vector
        // would be invisible to retrieval.
        let embedding = self.backend.embed_image(&bytes).await.map_err(|e| match e {
            Error::Embedding(msg) => Error::Embedding(format!("no embedding available: {}", msg)),
            other => other,
        })?;

        let stored = self
            .images
            .store(
                StoreImageRequest {
                    reference: request.reference.clone(),
                    content_hash,
                    account_name: request.account_name.clone(),
                    account_source: request.account_source.clone(),
                    session_id: request.session_id.clone(),
                    device_make: metadata.device_make.clone(),
                    device_model: metadata.device_model.clone(),
                    location,
                    taken_at,
                    focal_length_35mm: metadata.focal_length_35mm,
                    orientation_degrees: metadata.orientation_degrees,
                    metadata: serde_json::json!({
                        "content_type": content_type,
                        "device_make": metadata.device_make,
                        "device_model": metadata.device_model,
                        "altitude": metadata.location.and_then(|l| l.altitude),
                        "timezone": metadata.timezone.map(|tz| tz.name()),
                        "capture_time_raw": metadata.captured_at,
                        "parse_error": metadata.parse_error.clone(),
                    }),
                },
                embedding,
            )
            .await?;

        self.history
            .append(NewHistoryEntry {
                session_id: request.session_id.clone(),
                account_name: request.account_name.clone(),
                account_source: request.account_source.clone(),
                image_id: Some(stored.id),
                location,
                prompt: request.prompt.clone(),
            })
            .await?;

        info!(
            subsystem = "pipeline",
            component = "ingest",
            op = "ingest",
            image_id = %stored.id,
            deduplicated = stored.deduplicated,
            duration_ms = start.elapsed().as_millis() as u64,
            "Ingest complete"
        );

        Ok(IngestOutcome {
            image_id: stored.id,
            deduplicated: stored.deduplicated,
            location,
            metadata_parse_error: metadata.parse_error,
        })
    }

    /// Ingest a batch, one report per item. A failing item is reported
    /// and skipped; it never aborts the rest of the batch.
    pub async fn ingest_batch(&self, requests: &[IngestRequest]) -> Vec<IngestReport> {
        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.ingest_image(request).await;
            if let Err(e) = &outcome {
                warn!(
                    subsystem = "pipeline",
                    component = "ingest",
                    reference = %request.reference,
                    error = %e,
                    "Batch item failed, continuing"
                );
            }
            reports.push(IngestReport {
                reference: request.reference.clone(),
                outcome,
            });
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geosnap_core::{HistoryEntry, SimilarityResult, StoredImageId};
    use geosnap_inference::MockEmbeddingBackend;
    use pgvector::Vector;
    use std::sync::Mutex;

    /// In-memory image store keyed by content hash.
    #[derive(Default)]
    struct FakeImageRepo {
        stored: Mutex<Vec<(Uuid, StoreImageRequest)>>,
        embeddings_written: Mutex<usize>,
    }

    #[async_trait]
    impl ImageRepository for FakeImageRepo {
        async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Uuid>> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .find(|(_, r)| r.content_hash == content_hash)
                .map(|(id, _)| *id))
        }

        async fn store(
            &self,
            req: StoreImageRequest,
            _embedding: Vector,
        ) -> Result<StoredImageId> {
            let mut stored = self.stored.lock().unwrap();
            if let Some((id, _)) = stored.iter().find(|(_, r)| r.content_hash == req.content_hash)
            {
                return Ok(StoredImageId {
                    id: *id,
                    deduplicated: true,
                });
            }
            let id = Uuid::now_v7();
            stored.push((id, req));
            *self.embeddings_written.lock().unwrap() += 1;
            Ok(StoredImageId {
                id,
                deduplicated: false,
            })
        }

        async fn ids_within_radius(&self, _point: &GeoPoint, _radius_m: f64) -> Result<Vec<Uuid>> {
            Ok(Vec::new())
        }

        async fn rank_by_similarity(
            &self,
            _ids: &[Uuid],
            _query: &Vector,
            _threshold: f32,
            _limit: i64,
        ) -> Result<Vec<SimilarityResult>> {
            Ok(Vec::new())
        }
    }

    /// In-memory append-only history.
    #[derive(Default)]
    struct FakeHistoryRepo {
        entries: Mutex<Vec<(String, String, HistoryEntry)>>,
    }

    impl FakeHistoryRepo {
        fn seed(&self, session: &str, account: &str, entry: HistoryEntry) {
            self.entries
                .lock()
                .unwrap()
                .push((session.to_string(), account.to_string(), entry));
        }
    }

    #[async_trait]
    impl HistoryRepository for FakeHistoryRepo {
        async fn append(&self, entry: NewHistoryEntry) -> Result<Uuid> {
            let id = Uuid::now_v7();
            let session = entry.session_id.clone();
            let account = entry.account_name.clone();
            self.seed(
                &session,
                &account,
                HistoryEntry {
                    id,
                    occurred_at: Utc::now(),
                    location: entry.location,
                    attached_image_location: None,
                    prompt: entry.prompt,
                },
            );
            Ok(id)
        }

        async fn recent(
            &self,
            session_id: &str,
            account_name: &str,
            _lookback_hours: i64,
        ) -> Result<Vec<HistoryEntry>> {
            let mut matching: Vec<HistoryEntry> = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, a, _)| s == session_id && a == account_name)
                .map(|(_, _, e)| e.clone())
                .collect();
            matching.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
            Ok(matching)
        }

        async fn recent_as_of(
            &self,
            session_id: &str,
            account_name: &str,
            lookback_hours: i64,
            _now: chrono::DateTime<Utc>,
        ) -> Result<Vec<HistoryEntry>> {
            self.recent(session_id, account_name, lookback_hours).await
        }
    }

    fn ingestor(
        images: Arc<FakeImageRepo>,
        history: Arc<FakeHistoryRepo>,
        backend: MockEmbeddingBackend,
    ) -> ImageIngestor {
        ImageIngestor::new(images, history, Arc::new(backend), PipelineConfig::default())
    }

    fn request(reference: &str, bytes: &[u8]) -> IngestRequest {
        IngestRequest {
            source: ImageSource::InMemoryBytes(bytes.to_vec()),
            reference: reference.to_string(),
            account_name: "alice".to_string(),
            account_source: "mobile".to_string(),
            session_id: "session-1".to_string(),
            described_accurate: None,
            described_rough: None,
            prompt: None,
        }
    }

    #[tokio::test]
    async fn test_ingest_stores_and_appends_history() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());
        let ing = ingestor(images.clone(), history.clone(), MockEmbeddingBackend::new());

        let outcome = ing
            .ingest_image(&request("photo.jpg", b"not-really-a-jpeg"))
            .await
            .unwrap();

        assert!(!outcome.deduplicated);
        // Plain bytes carry no EXIF and no described location was given.
        assert_eq!(outcome.location, None);
        assert_eq!(images.stored.lock().unwrap().len(), 1);
        assert_eq!(history.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reingest_same_bytes_is_idempotent() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());
        let ing = ingestor(images.clone(), history.clone(), MockEmbeddingBackend::new());

        let first = ing.ingest_image(&request("a.jpg", b"same")).await.unwrap();
        let second = ing.ingest_image(&request("b.jpg", b"same")).await.unwrap();

        assert_eq!(first.image_id, second.image_id);
        assert!(second.deduplicated);
        assert_eq!(*images.embeddings_written.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_writes_nothing() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());
        let ing = ingestor(
            images.clone(),
            history.clone(),
            MockEmbeddingBackend::new().with_failure("service down"),
        );

        let err = ing
            .ingest_image(&request("photo.jpg", b"bytes"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("no embedding available"));
        assert!(images.stored.lock().unwrap().is_empty());
        assert!(history.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_described_location_flows_to_store_and_history() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());
        let ing = ingestor(images.clone(), history.clone(), MockEmbeddingBackend::new());

        let stated = GeoPoint::new(40.7128, -74.006).unwrap();
        let mut req = request("photo.jpg", b"bytes");
        req.described_accurate = Some(stated);

        let outcome = ing.ingest_image(&req).await.unwrap();
        assert_eq!(outcome.location, Some(stated));

        let stored = images.stored.lock().unwrap();
        assert_eq!(stored[0].1.location, Some(stated));
        let entries = history.entries.lock().unwrap();
        assert_eq!(entries[0].2.location, Some(stated));
    }

    #[tokio::test]
    async fn test_history_location_recovered_when_no_other_source() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());

        let prior = GeoPoint::new(48.8566, 2.3522).unwrap();
        history.seed(
            "session-1",
            "alice",
            HistoryEntry {
                id: Uuid::now_v7(),
                occurred_at: Utc::now() - chrono::Duration::minutes(30),
                location: Some(prior),
                attached_image_location: None,
                prompt: None,
            },
        );

        let ing = ingestor(images.clone(), history.clone(), MockEmbeddingBackend::new());
        let outcome = ing
            .ingest_image(&request("photo.jpg", b"bytes"))
            .await
            .unwrap();
        assert_eq!(outcome.location, Some(prior));
    }

    #[tokio::test]
    async fn test_described_rough_beats_history_accurate() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());

        history.seed(
            "session-1",
            "alice",
            HistoryEntry {
                id: Uuid::now_v7(),
                occurred_at: Utc::now() - chrono::Duration::minutes(30),
                location: Some(GeoPoint::new(3.0, 4.0).unwrap()),
                attached_image_location: None,
                prompt: None,
            },
        );

        let rough = GeoPoint::new(1.0, 2.0).unwrap();
        let mut req = request("photo.jpg", b"bytes");
        req.described_rough = Some(rough);

        let ing = ingestor(images, history, MockEmbeddingBackend::new());
        let outcome = ing.ingest_image(&req).await.unwrap();
        assert_eq!(outcome.location, Some(rough));
    }

    #[tokio::test]
    async fn test_missing_file_rejects_item_only() {
        let images = Arc::new(FakeImageRepo::default());
        let history = Arc::new(FakeHistoryRepo::default());
        let ing = ingestor(images.clone(), history, MockEmbeddingBackend::new());

        let mut missing = request("gone.jpg", b"");
        missing.source = ImageSource::FilePath("/nonexistent/gone.jpg".into());
        let ok = request("fine.jpg", b"fine-bytes");

        let reports = ing.ingest_batch(&[missing, ok]).await;
        assert_eq!(reports.len(), 2);
        assert!(matches!(
            reports[0].outcome.as_ref().unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(reports[1].outcome.is_ok());
        assert_eq!(images.stored.lock().unwrap().len(), 1);
    }
}
