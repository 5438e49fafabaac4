//! Structured logging schema and field name constants for geosnap.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized names
//! across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (retrieval hits) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "db", "inference", "search", "pipeline"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "exif", "retrieval", "pool", "vision", "ingest"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "extract", "store", "search", "embed_image"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Image UUID being operated on.
pub const IMAGE_ID: &str = "image_id";

/// External chat session identifier.
pub const SESSION_ID: &str = "session_id";

/// Account name the operation runs for.
pub const ACCOUNT: &str = "account";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Retrieval fields ──────────────────────────────────────────────────────

/// Stage-A spatial radius in meters.
pub const RADIUS_M: &str = "radius_m";

/// Stage-B similarity threshold.
pub const THRESHOLD: &str = "threshold";

/// Result limit.
pub const LIMIT: &str = "limit";

/// Embedding dimension.
pub const DIMENSION: &str = "dimension";

/// Number of Stage-A spatial survivors before similarity ranking.
pub const SPATIAL_HITS: &str = "spatial_hits";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Whether a store call was deduplicated by content hash.
pub const DEDUPLICATED: &str = "deduplicated";
