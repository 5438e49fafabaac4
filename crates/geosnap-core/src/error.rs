//! Error types for geosnap.

use thiserror::Error;

/// Result type alias using geosnap's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for geosnap operations.
///
/// Partial or missing capture metadata is never an error anywhere in the
/// pipeline; an unreadable image yields a [`crate::CapturedMetadata`] with
/// its `parse_error` field set rather than a variant here.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error). A failure inside the
    /// ingest transaction rolls the whole image+embedding unit back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced resource (e.g. an upload's file path) does not exist.
    /// Rejects the specific operation, never an entire batch.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Embedding service call failed; surfaced as "no embedding available",
    /// never retried internally.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (malformed point, wrong-dimension embedding, missing
    /// required identifiers). Rejected before any query executes.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("/photos/missing.jpg".to_string());
        assert_eq!(err.to_string(), "Not found: /photos/missing.jpg");
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("vision endpoint returned 503".to_string());
        assert_eq!(
            err.to_string(),
            "Embedding error: vision endpoint returned 503"
        );
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("latitude out of range".to_string());
        assert_eq!(err.to_string(), "Invalid input: latitude out of range");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing endpoint".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
