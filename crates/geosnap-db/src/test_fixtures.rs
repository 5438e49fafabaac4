//! Shared helpers for integration tests that need a live PostgreSQL
//! instance with PostGIS and pgvector installed.
//!
//! Tests read `DATABASE_URL` (via `.env` if present) and are marked
//! `#[ignore]` so the default test run stays hermetic.

use sqlx::PgPool;

use geosnap_core::{Error, Result};

/// Resolve the test database URL from the environment.
pub fn test_database_url() -> Result<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .map_err(|_| Error::Config("DATABASE_URL not set for integration tests".to_string()))
}

/// Create the full schema if it does not exist yet.
///
/// Idempotent, so every test can call it; the `vector` column is left
/// undimensioned to let tests exercise any embedding size.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
        .execute(pool)
        .await
        .map_err(Error::Database)?;
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    let ddl = [
        "CREATE TABLE IF NOT EXISTS account (
             id UUID PRIMARY KEY,
             name TEXT NOT NULL,
             source TEXT NOT NULL,
             created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
             UNIQUE (name, source)
         )",
        "CREATE TABLE IF NOT EXISTS chat_session (
             id UUID PRIMARY KEY,
             session_id TEXT NOT NULL UNIQUE,
             created_at TIMESTAMPTZ NOT NULL DEFAULT now()
         )",
        "CREATE TABLE IF NOT EXISTS device (
             id UUID PRIMARY KEY,
             make TEXT NOT NULL,
             model TEXT NOT NULL,
             UNIQUE (make, model)
         )",
        "CREATE TABLE IF NOT EXISTS image (
             id UUID PRIMARY KEY,
             reference TEXT NOT NULL,
             content_hash TEXT NOT NULL UNIQUE,
             account_id UUID NOT NULL REFERENCES account(id),
             device_id UUID REFERENCES device(id),
             location GEOGRAPHY,
             taken_at TIMESTAMPTZ NOT NULL,
             focal_length_35mm INTEGER,
             orientation_degrees DOUBLE PRECISION,
             metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
             created_at TIMESTAMPTZ NOT NULL DEFAULT now()
         )",
        "CREATE TABLE IF NOT EXISTS embedding (
             id UUID PRIMARY KEY,
             image_id UUID NOT NULL REFERENCES image(id) ON DELETE CASCADE,
             vector vector NOT NULL,
             created_at TIMESTAMPTZ NOT NULL DEFAULT now()
         )",
        "CREATE TABLE IF NOT EXISTS chat_history (
             id UUID PRIMARY KEY,
             session_id UUID NOT NULL REFERENCES chat_session(id),
             account_id UUID NOT NULL REFERENCES account(id),
             image_id UUID REFERENCES image(id),
             location GEOGRAPHY,
             prompt TEXT,
             occurred_at TIMESTAMPTZ NOT NULL DEFAULT now()
         )",
        "CREATE INDEX IF NOT EXISTS idx_image_location ON image USING GIST (location)",
        "CREATE INDEX IF NOT EXISTS idx_history_session
             ON chat_history (session_id, occurred_at DESC)",
    ];

    for statement in ddl {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    Ok(())
}

/// Remove all rows so each test starts from a clean slate.
pub async fn truncate_all(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "TRUNCATE chat_history, embedding, image, device, chat_session, account CASCADE",
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;
    Ok(())
}
