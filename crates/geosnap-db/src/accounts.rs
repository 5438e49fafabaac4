//! Transaction-scoped upserts for accounts, chat sessions, and devices.
//!
//! These rows are created on demand during ingestion and history writes,
//! inside the caller's transaction so the whole unit commits or rolls
//! back together.

use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use geosnap_core::{Error, Result};

/// Upsert an account by (name, source) and return its id.
pub(crate) async fn upsert_account_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    source: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO account (id, name, source, created_at)
         VALUES ($1, $2, $3, now())
         ON CONFLICT (name, source) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(source)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(row.get("id"))
}

/// Upsert a chat session by its external identifier and return its id.
pub(crate) async fn upsert_session_tx(
    tx: &mut Transaction<'_, Postgres>,
    session_id: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO chat_session (id, session_id, created_at)
         VALUES ($1, $2, now())
         ON CONFLICT (session_id) DO UPDATE SET session_id = EXCLUDED.session_id
         RETURNING id",
    )
    .bind(Uuid::now_v7())
    .bind(session_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(row.get("id"))
}

/// Upsert a device by (make, model) and return its id.
pub(crate) async fn upsert_device_tx(
    tx: &mut Transaction<'_, Postgres>,
    make: &str,
    model: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO device (id, make, model)
         VALUES ($1, $2, $3)
         ON CONFLICT (make, model) DO UPDATE SET make = EXCLUDED.make
         RETURNING id",
    )
    .bind(Uuid::now_v7())
    .bind(make)
    .bind(model)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(row.get("id"))
}
