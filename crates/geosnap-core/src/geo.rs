//! Geographic point type with WKT rendering.
//!
//! The text representation is the PostGIS-compatible Well-Known Text form
//! with longitude before latitude: `POINT(lon lat)` for 2-D points and
//! `POINT(lon lat alt)` when an altitude is available. The dimensionality
//! is a direct function of altitude availability, never a caller flag.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A geographic coordinate in decimal degrees (WGS 84).
///
/// Latitude must lie in [-90, 90] and longitude in [-180, 180]; a value
/// outside that range is rejected at construction, never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees (positive = North, negative = South)
    pub latitude: f64,

    /// Longitude in decimal degrees (positive = East, negative = West)
    pub longitude: f64,

    /// Altitude in meters above sea level (negative = below sea level)
    pub altitude: Option<f64>,
}

impl GeoPoint {
    /// Create a 2-D point, validating coordinate ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self {
            latitude,
            longitude,
            altitude: None,
        };
        point.validate()?;
        Ok(point)
    }

    /// Attach an altitude in meters.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Check the coordinate-range invariant.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidInput(format!(
                "Invalid latitude {}: must be between -90 and 90",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidInput(format!(
                "Invalid longitude {}: must be between -180 and 180",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Render as a WKT point: `POINT(lon lat)` or `POINT(lon lat alt)`.
    pub fn to_wkt(&self) -> String {
        match self.altitude {
            Some(alt) => format!("POINT({} {} {})", self.longitude, self.latitude, alt),
            None => format!("POINT({} {})", self.longitude, self.latitude),
        }
    }

    /// Parse a WKT point, recovering coordinates and optional altitude.
    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let inner = wkt
            .trim()
            .strip_prefix("POINT(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| Error::InvalidInput(format!("Malformed WKT point: {}", wkt)))?;

        let coords: Vec<f64> = inner
            .split_whitespace()
            .map(|part| {
                part.parse::<f64>()
                    .map_err(|_| Error::InvalidInput(format!("Malformed WKT coordinate: {}", part)))
            })
            .collect::<Result<_>>()?;

        let point = match coords.as_slice() {
            [lon, lat] => GeoPoint::new(*lat, *lon)?,
            [lon, lat, alt] => GeoPoint::new(*lat, *lon)?.with_altitude(*alt),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "WKT point must have 2 or 3 coordinates, got {}",
                    coords.len()
                )))
            }
        };
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wkt_2d() {
        let point = GeoPoint::new(40.7128, -74.0060).unwrap();
        assert_eq!(point.to_wkt(), "POINT(-74.006 40.7128)");
    }

    #[test]
    fn test_to_wkt_3d_when_altitude_present() {
        let point = GeoPoint::new(48.8584, 2.2945).unwrap().with_altitude(35.5);
        assert_eq!(point.to_wkt(), "POINT(2.2945 48.8584 35.5)");
    }

    #[test]
    fn test_to_wkt_negative_altitude() {
        let point = GeoPoint::new(31.5, 35.47).unwrap().with_altitude(-430.0);
        assert_eq!(point.to_wkt(), "POINT(35.47 31.5 -430)");
    }

    #[test]
    fn test_new_rejects_out_of_range_latitude() {
        assert!(GeoPoint::new(90.0001, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_new_rejects_out_of_range_longitude() {
        assert!(GeoPoint::new(0.0, 180.0001).is_err());
        assert!(GeoPoint::new(0.0, -200.0).is_err());
    }

    #[test]
    fn test_new_accepts_boundary_values() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_wkt_round_trip_2d() {
        let point = GeoPoint::new(40.7128, -74.0060).unwrap();
        let parsed = GeoPoint::from_wkt(&point.to_wkt()).unwrap();
        assert!((parsed.latitude - point.latitude).abs() < 1e-9);
        assert!((parsed.longitude - point.longitude).abs() < 1e-9);
        assert!(parsed.altitude.is_none());
    }

    #[test]
    fn test_wkt_round_trip_3d() {
        let point = GeoPoint::new(-33.8688, 151.2093)
            .unwrap()
            .with_altitude(58.3);
        let parsed = GeoPoint::from_wkt(&point.to_wkt()).unwrap();
        assert!((parsed.latitude - point.latitude).abs() < 1e-9);
        assert!((parsed.longitude - point.longitude).abs() < 1e-9);
        assert!((parsed.altitude.unwrap() - 58.3).abs() < 1e-9);
    }

    #[test]
    fn test_from_wkt_rejects_malformed_text() {
        assert!(GeoPoint::from_wkt("LINESTRING(0 0, 1 1)").is_err());
        assert!(GeoPoint::from_wkt("POINT(1)").is_err());
        assert!(GeoPoint::from_wkt("POINT(1 2 3 4)").is_err());
        assert!(GeoPoint::from_wkt("POINT(a b)").is_err());
        assert!(GeoPoint::from_wkt("").is_err());
    }

    #[test]
    fn test_from_wkt_rejects_out_of_range_coordinates() {
        // Valid syntax, invalid ranges: rejected, not clamped.
        assert!(GeoPoint::from_wkt("POINT(190 10)").is_err());
        assert!(GeoPoint::from_wkt("POINT(10 95)").is_err());
    }

    #[test]
    fn test_extreme_but_valid_coordinates() {
        assert_eq!(
            GeoPoint::new(90.0, 0.0).unwrap().to_wkt(),
            "POINT(0 90)"
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.0).unwrap().to_wkt(),
            "POINT(-180 0)"
        );
    }
}
