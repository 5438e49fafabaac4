//! Append-only interaction history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use geosnap_core::{Error, GeoPoint, HistoryEntry, HistoryRepository, NewHistoryEntry, Result};

use crate::accounts::{upsert_account_tx, upsert_session_tx};
use crate::images::point_from_row;

/// PostgreSQL implementation of [`HistoryRepository`].
#[derive(Debug, Clone)]
pub struct PgHistoryRepository {
    pool: PgPool,
}

impl PgHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn append(&self, entry: NewHistoryEntry) -> Result<Uuid> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let account_id =
            upsert_account_tx(&mut tx, &entry.account_name, &entry.account_source).await?;
        let session_pk = upsert_session_tx(&mut tx, &entry.session_id).await?;

        let wkt = entry.location.as_ref().map(GeoPoint::to_wkt);

        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO chat_history (id, session_id, account_id, image_id,
                                       location, prompt, occurred_at)
             VALUES ($1, $2, $3, $4,
                     CASE WHEN $5::text IS NULL THEN NULL
                          ELSE ST_GeogFromText($5) END,
                     $6, now())",
        )
        .bind(id)
        .bind(session_pk)
        .bind(account_id)
        .bind(entry.image_id)
        .bind(&wkt)
        .bind(&entry.prompt)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "history",
            op = "append",
            session_id = %entry.session_id,
            account = %entry.account_name,
            "History entry appended"
        );

        Ok(id)
    }

    async fn recent(
        &self,
        session_id: &str,
        account_name: &str,
        lookback_hours: i64,
    ) -> Result<Vec<HistoryEntry>> {
        self.recent_as_of(session_id, account_name, lookback_hours, Utc::now())
            .await
    }

    async fn recent_as_of(
        &self,
        session_id: &str,
        account_name: &str,
        lookback_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT h.id, h.occurred_at, h.prompt,
                    ST_Y(h.location::geometry) AS lat,
                    ST_X(h.location::geometry) AS lon,
                    ST_Z(h.location::geometry) AS alt,
                    ST_Y(i.location::geometry) AS img_lat,
                    ST_X(i.location::geometry) AS img_lon,
                    ST_Z(i.location::geometry) AS img_alt
             FROM chat_history h
             JOIN chat_session s ON s.id = h.session_id
             JOIN account a ON a.id = h.account_id
             LEFT JOIN image i ON i.id = h.image_id
             WHERE s.session_id = $1
               AND a.name = $2
               AND ($3 <= 0 OR h.occurred_at >= $4 - make_interval(hours => $3::int))
             ORDER BY h.occurred_at DESC, h.id DESC",
        )
        .bind(session_id)
        .bind(account_name)
        .bind(lookback_hours)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let attached_image_location = {
                let lat: Option<f64> = row.try_get("img_lat").map_err(Error::Database)?;
                let lon: Option<f64> = row.try_get("img_lon").map_err(Error::Database)?;
                let alt: Option<f64> = row.try_get("img_alt").map_err(Error::Database)?;
                match (lat, lon) {
                    (Some(lat), Some(lon)) => {
                        let mut point = GeoPoint::new(lat, lon)?;
                        point.altitude = alt;
                        Some(point)
                    }
                    _ => None,
                }
            };

            entries.push(HistoryEntry {
                id: row.get("id"),
                occurred_at: row.get("occurred_at"),
                location: point_from_row(row)?,
                attached_image_location,
                prompt: row.get("prompt"),
            });
        }

        debug!(
            subsystem = "db",
            component = "history",
            op = "recent",
            session_id = %session_id,
            account = %account_name,
            lookback_hours = lookback_hours,
            result_count = entries.len(),
            "History window loaded"
        );

        Ok(entries)
    }
}
