//! Default values shared across the geosnap crates.
//!
//! Centralized so retrieval, ingestion, and configuration agree on one
//! set of numbers.

/// Stage-A spatial filter radius, in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// Minimum cosine similarity for a Stage-B survivor to be returned.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Maximum number of retrieval results.
pub const DEFAULT_RESULT_LIMIT: i64 = 3;

/// History lookback horizon in hours; 0 scans the entire history.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 0;

/// Embedding dimension of the stored corpus.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;

/// Fallback zone applied when no timezone can be resolved from a fix.
pub const DEFAULT_TIMEZONE: chrono_tz::Tz = chrono_tz::Tz::UTC;

/// EXIF local capture-time format (no UTC offset).
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        assert_eq!(DEFAULT_RADIUS_METERS, 1000.0);
        assert_eq!(DEFAULT_SIMILARITY_THRESHOLD, 0.5);
        assert_eq!(DEFAULT_RESULT_LIMIT, 3);
        assert_eq!(DEFAULT_LOOKBACK_HOURS, 0);
    }
}
