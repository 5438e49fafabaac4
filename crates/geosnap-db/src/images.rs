//! Image storage and the two geospatial/vector queries behind retrieval.

use std::time::Instant;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, trace};
use uuid::Uuid;

use geosnap_core::{
    Error, GeoPoint, ImageRepository, Result, SimilarityResult, StoreImageRequest, StoredImageId,
};

use crate::accounts::{upsert_account_tx, upsert_device_tx, upsert_session_tx};

/// PostgreSQL implementation of [`ImageRepository`], backed by PostGIS
/// for the spatial stage and pgvector for the similarity stage.
#[derive(Debug, Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Read an optional point back from `ST_X/ST_Y/ST_Z` columns.
///
/// A stored point is trusted: it was range-checked on the way in, so a
/// row that fails reconstruction indicates corruption and surfaces as an
/// error rather than a silent `None`.
pub(crate) fn point_from_row(row: &PgRow) -> Result<Option<GeoPoint>> {
    let lat: Option<f64> = row.try_get("lat").map_err(Error::Database)?;
    let lon: Option<f64> = row.try_get("lon").map_err(Error::Database)?;
    let alt: Option<f64> = row.try_get("alt").map_err(Error::Database)?;

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let mut point = GeoPoint::new(lat, lon)?;
            point.altitude = alt;
            Ok(Some(point))
        }
        _ => Ok(None),
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT id FROM image WHERE content_hash = $1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get("id")))
    }

    async fn store(&self, req: StoreImageRequest, embedding: Vector) -> Result<StoredImageId> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let account_id = upsert_account_tx(&mut tx, &req.account_name, &req.account_source).await?;
        upsert_session_tx(&mut tx, &req.session_id).await?;

        let device_id = match (&req.device_make, &req.device_model) {
            (Some(make), Some(model)) => Some(upsert_device_tx(&mut tx, make, model).await?),
            _ => None,
        };

        // Hash-first dedup inside the transaction: a concurrent ingest of
        // the same bytes loses the race at the unique index instead.
        let existing = sqlx::query("SELECT id FROM image WHERE content_hash = $1")
            .bind(&req.content_hash)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if let Some(row) = existing {
            tx.commit().await.map_err(Error::Database)?;
            let id: Uuid = row.get("id");
            info!(
                subsystem = "db",
                component = "images",
                op = "store",
                image_id = %id,
                deduplicated = true,
                duration_ms = start.elapsed().as_millis() as u64,
                "Image already stored, returning existing record"
            );
            return Ok(StoredImageId {
                id,
                deduplicated: true,
            });
        }

        let wkt = req.location.as_ref().map(GeoPoint::to_wkt);

        let inserted = sqlx::query(
            "INSERT INTO image (id, reference, content_hash, account_id, device_id,
                                location, taken_at, focal_length_35mm,
                                orientation_degrees, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5,
                     CASE WHEN $6::text IS NULL THEN NULL
                          ELSE ST_GeogFromText($6) END,
                     $7, $8, $9, $10, now())
             ON CONFLICT (content_hash) DO NOTHING
             RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(&req.reference)
        .bind(&req.content_hash)
        .bind(account_id)
        .bind(device_id)
        .bind(&wkt)
        .bind(req.taken_at)
        .bind(req.focal_length_35mm)
        .bind(req.orientation_degrees)
        .bind(&req.metadata)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let id = match inserted {
            Some(row) => row.get::<Uuid, _>("id"),
            // Lost the race: fetch the winner's row and skip the embedding.
            None => {
                let row = sqlx::query("SELECT id FROM image WHERE content_hash = $1")
                    .bind(&req.content_hash)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(Error::Database)?;
                tx.commit().await.map_err(Error::Database)?;
                return Ok(StoredImageId {
                    id: row.get("id"),
                    deduplicated: true,
                });
            }
        };

        sqlx::query(
            "INSERT INTO embedding (id, image_id, vector, created_at)
             VALUES ($1, $2, $3, now())",
        )
        .bind(Uuid::now_v7())
        .bind(id)
        .bind(&embedding)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "images",
            op = "store",
            image_id = %id,
            deduplicated = false,
            duration_ms = start.elapsed().as_millis() as u64,
            "Image and embedding stored"
        );

        Ok(StoredImageId {
            id,
            deduplicated: false,
        })
    }

    async fn ids_within_radius(&self, point: &GeoPoint, radius_m: f64) -> Result<Vec<Uuid>> {
        let start = Instant::now();

        let rows = sqlx::query(
            "SELECT id FROM image
             WHERE location IS NOT NULL
               AND ST_DWithin(
                     location,
                     ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                     $3)
             ORDER BY id ASC",
        )
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(radius_m)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();

        debug!(
            subsystem = "db",
            component = "images",
            op = "radius",
            radius_m = radius_m,
            result_count = ids.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Spatial radius query complete"
        );

        Ok(ids)
    }

    async fn rank_by_similarity(
        &self,
        ids: &[Uuid],
        query: &Vector,
        threshold: f32,
        limit: i64,
    ) -> Result<Vec<SimilarityResult>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();

        let rows = sqlx::query(
            "SELECT i.id, i.reference, i.metadata,
                    ST_Y(i.location::geometry) AS lat,
                    ST_X(i.location::geometry) AS lon,
                    ST_Z(i.location::geometry) AS alt,
                    1.0 - (e.vector <=> $1::vector) AS similarity
             FROM image i
             JOIN embedding e ON e.image_id = i.id
             WHERE i.id = ANY($2)
               AND 1.0 - (e.vector <=> $1::vector) >= $3
             ORDER BY similarity DESC, i.id ASC
             LIMIT $4",
        )
        .bind(query)
        .bind(ids)
        .bind(threshold as f64)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let result = SimilarityResult {
                id: row.get("id"),
                reference: row.get("reference"),
                location: point_from_row(row)?,
                similarity: row.get::<f64, _>("similarity") as f32,
                metadata: row.get("metadata"),
            };
            trace!(
                subsystem = "db",
                component = "images",
                image_id = %result.id,
                similarity = result.similarity,
                "Similarity hit"
            );
            results.push(result);
        }

        debug!(
            subsystem = "db",
            component = "images",
            op = "rank",
            threshold = threshold,
            limit = limit,
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Similarity ranking complete"
        );

        Ok(results)
    }
}
