//! # geosnap-db
//!
//! PostgreSQL database layer for geosnap.
//!
//! This crate provides:
//! - Repository implementations for images, embeddings, and history
//! - Geodesic radius filtering with PostGIS
//! - Cosine similarity ranking with pgvector
//!
//! ## Example
//!
//! ```rust,ignore
//! use geosnap_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/geosnap").await?;
//!
//!     let id = db.images.find_by_content_hash("9f86d0…").await?;
//!     println!("Existing image: {id:?}");
//!     Ok(())
//! }
//! ```
mod accounts;
pub mod history;
pub mod images;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use them.
pub mod test_fixtures;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

// Re-export core types
pub use geosnap_core::*;

pub use history::PgHistoryRepository;
pub use images::PgImageRepository;

/// Connection pool settings for [`Database::connect_with_config`].
///
/// The defaults fit a single ingestion worker; batch jobs that fan out
/// over many images raise `max_connections`.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a free connection before giving up.
    pub acquire_timeout: Duration,
    /// How long an unused connection is kept before being closed.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Image and embedding repository.
    pub images: PgImageRepository,
    /// Interaction history repository.
    pub history: PgHistoryRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            images: PgImageRepository::new(pool.clone()),
            history: PgHistoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to the database and build the full context.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with_config(database_url, PoolConfig::default()).await
    }

    /// Connect with a custom pool configuration.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(database_url)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "pool",
            op = "connect",
            max_connections = config.max_connections,
            pool_size = pool.size(),
            "Database connection pool established"
        );

        Ok(Self::new(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::new()
            .max_connections(32)
            .min_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 32);
        assert_eq!(config.min_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
    }
}
