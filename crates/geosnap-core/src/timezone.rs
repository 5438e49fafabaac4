//! Coordinate → timezone resolution and capture-time localization.
//!
//! EXIF capture timestamps are local wall-clock strings with no UTC
//! offset. The zone is inferred from the GPS fix; when that fails (open
//! ocean, no fix) callers fall back to an explicitly configured default
//! zone, never an implicit truncation to UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

use crate::defaults::EXIF_DATETIME_FORMAT;
use crate::geo::GeoPoint;

// The finder embeds its polygon data and is expensive to build; it is
// read-only after construction.
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Resolve the IANA timezone containing a coordinate.
///
/// Pure lookup: no state, no side effects. Returns `None` when the
/// coordinate maps to no known zone.
pub fn resolve_timezone(point: &GeoPoint) -> Option<Tz> {
    let name = FINDER.get_tz_name(point.longitude, point.latitude);
    if name.is_empty() {
        return None;
    }
    name.parse().ok()
}

/// Localize a raw EXIF capture-time string (`"YYYY:MM:DD HH:MM:SS"`) into
/// an absolute instant.
///
/// `zone` is the zone resolved from the GPS fix; `default_zone` is the
/// configured process fallback, applied explicitly when no zone could be
/// resolved. Returns `None` for an unparseable timestamp or a wall-clock
/// time that does not exist in the zone (DST gap).
pub fn localize_capture_time(
    raw: &str,
    zone: Option<Tz>,
    default_zone: Tz,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATETIME_FORMAT).ok()?;
    let tz = zone.unwrap_or(default_zone);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_resolve_timezone_paris() {
        let point = GeoPoint::new(48.8584, 2.2945).unwrap();
        assert_eq!(resolve_timezone(&point), Some(Tz::Europe__Paris));
    }

    #[test]
    fn test_resolve_timezone_new_york() {
        let point = GeoPoint::new(40.7128, -74.0060).unwrap();
        assert_eq!(resolve_timezone(&point), Some(Tz::America__New_York));
    }

    #[test]
    fn test_resolve_timezone_is_deterministic() {
        let point = GeoPoint::new(-33.8688, 151.2093).unwrap();
        assert_eq!(resolve_timezone(&point), resolve_timezone(&point));
    }

    #[test]
    fn test_localize_with_resolved_zone() {
        // Winter date: Paris is UTC+1.
        let instant =
            localize_capture_time("2023:01:01 15:34:30", Some(Tz::Europe__Paris), Tz::UTC)
                .unwrap();
        assert_eq!(instant.hour(), 14);
        assert_eq!(instant.minute(), 34);
    }

    #[test]
    fn test_localize_falls_back_to_default_zone() {
        // No resolved zone: the configured default applies, explicitly.
        let instant =
            localize_capture_time("2023:06:15 12:00:00", None, Tz::Asia__Tokyo).unwrap();
        assert_eq!(instant.hour(), 3);
    }

    #[test]
    fn test_localize_rejects_malformed_timestamp() {
        assert!(localize_capture_time("2023-01-01 15:34:30", None, Tz::UTC).is_none());
        assert!(localize_capture_time("yesterday", None, Tz::UTC).is_none());
        assert!(localize_capture_time("", None, Tz::UTC).is_none());
    }
}
