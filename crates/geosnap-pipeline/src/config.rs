//! Pipeline configuration.

use chrono_tz::Tz;

use geosnap_core::defaults::{DEFAULT_LOOKBACK_HOURS, DEFAULT_TIMEZONE};

/// Configuration for the ingestion pipeline.
///
/// Explicit struct, no global state: the default timezone in particular
/// is an operational choice (where the deployment's users mostly are),
/// not something the pipeline should guess.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Zone applied to capture timestamps when no GPS fix resolves one.
    pub default_timezone: Tz,
    /// History window for location recovery; 0 scans the whole history.
    pub lookback_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_timezone: DEFAULT_TIMEZONE,
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback timezone for capture timestamps.
    pub fn with_default_timezone(mut self, tz: Tz) -> Self {
        self.default_timezone = tz;
        self
    }

    /// Set the history lookback window in hours (0 = unbounded).
    pub fn with_lookback_hours(mut self, hours: i64) -> Self {
        self.lookback_hours = hours;
        self
    }
}
