//! Capture-metadata extraction for uploaded photographs.
//!
//! Parses embedded EXIF tags (GPS fix, device, capture time, heading) from
//! raw image bytes. Supports JPEG, PNG, HEIF/HEIC, TIFF, and WebP
//! containers via kamadak-exif.
//!
//! Two outcomes are deliberately not errors:
//! - an image with no tag table yields an **empty** record, and
//! - an unreadable/corrupt binary yields a record with only `parse_error`
//!   set, so batch callers can skip one bad file without aborting.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::GeoPoint;
use crate::timezone::resolve_timezone;
use crate::{Error, Result};

/// Where the image bytes come from. Resolved exactly once at the boundary;
/// nothing downstream re-sniffs the payload kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Path to an image on the local filesystem.
    FilePath(PathBuf),
    /// Raw image bytes already in memory.
    InMemoryBytes(Vec<u8>),
    /// Base64-encoded image payload (standard alphabet).
    EncodedText(String),
}

impl ImageSource {
    /// Resolve the source into raw bytes.
    ///
    /// A missing file path is `Error::NotFound` (rejects this upload, not
    /// the batch); an undecodable base64 payload is `Error::InvalidInput`.
    pub fn resolve(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::FilePath(path) => {
                if !path.exists() {
                    return Err(Error::NotFound(path.display().to_string()));
                }
                Ok(Cow::Owned(std::fs::read(path)?))
            }
            Self::InMemoryBytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::EncodedText(text) => BASE64
                .decode(text.trim())
                .map(Cow::Owned)
                .map_err(|e| Error::InvalidInput(format!("Invalid base64 image payload: {}", e))),
        }
    }
}

/// Capture metadata extracted from an image. Produced once per image and
/// immutable thereafter; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedMetadata {
    /// GPS fix resolved to decimal degrees (with altitude when recorded).
    pub location: Option<GeoPoint>,

    /// Raw local capture-time string from DateTimeOriginal, verbatim.
    /// Carries no UTC offset; localize via [`crate::localize_capture_time`].
    pub captured_at: Option<String>,

    /// IANA zone resolved from the GPS fix, if any.
    pub timezone: Option<chrono_tz::Tz>,

    /// Camera/device manufacturer (EXIF Make tag)
    pub device_make: Option<String>,

    /// Camera/device model (EXIF Model tag)
    pub device_model: Option<String>,

    /// Focal length, 35mm equivalent.
    pub focal_length_35mm: Option<i32>,

    /// Heading in degrees relative to true north (GPSImgDirection).
    /// Independent of GPS fix presence; missing or non-numeric is absent,
    /// never zero.
    pub orientation_degrees: Option<f64>,

    /// Set when the binary was unreadable. All other fields are empty in
    /// that case.
    pub parse_error: Option<String>,
}

impl CapturedMetadata {
    /// True when no field at all was extracted (and no parse failure).
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Extract capture metadata from an image source, resolving the source
/// exactly once. Source-resolution failures (missing path, bad base64)
/// reject this specific upload; parse failures do not.
pub fn extract_from_source(source: &ImageSource) -> Result<CapturedMetadata> {
    let bytes = source.resolve()?;
    Ok(extract_metadata(&bytes))
}

/// Extract capture metadata from raw image bytes. Infallible by design:
/// absence of metadata is a normal outcome and corrupt input is reported
/// through the `parse_error` field.
pub fn extract_metadata(data: &[u8]) -> CapturedMetadata {
    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);
    let mut cursor = Cursor::new(data);

    let exif = match reader
        .read_from_container(&mut cursor)
        .or_else(|e| e.distill_partial_result(|_| {}))
    {
        Ok(exif) => exif,
        // No embedded tag table at all: a normal outcome, not a failure.
        Err(exif::Error::NotFound(_)) => return CapturedMetadata::default(),
        Err(e) => {
            return CapturedMetadata {
                parse_error: Some(format!("Failed to read EXIF data: {}", e)),
                ..Default::default()
            }
        }
    };

    let location = extract_gps(&exif);

    CapturedMetadata {
        timezone: location.as_ref().and_then(resolve_timezone),
        location,
        captured_at: extract_ascii_field(&exif, exif::Tag::DateTimeOriginal),
        device_make: extract_ascii_field(&exif, exif::Tag::Make),
        device_model: extract_ascii_field(&exif, exif::Tag::Model),
        focal_length_35mm: extract_u32_field(&exif, exif::Tag::FocalLengthIn35mmFilm)
            .map(|v| v as i32),
        orientation_degrees: extract_rational_field(&exif, exif::Tag::GPSImgDirection),
        parse_error: None,
    }
}

/// Extract the GPS fix (latitude/longitude, optional altitude).
fn extract_gps(exif: &exif::Exif) -> Option<GeoPoint> {
    let lat = extract_gps_coordinate(exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef)?;
    let lon = extract_gps_coordinate(exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef)?;

    let point = match GeoPoint::new(lat, lon) {
        Ok(point) => point,
        Err(e) => {
            // Out-of-range fix is rejected, never clamped.
            warn!(
                subsystem = "core",
                component = "exif",
                error = %e,
                "Discarding out-of-range GPS fix"
            );
            return None;
        }
    };

    match extract_gps_altitude(exif) {
        Some(alt) => Some(point.with_altitude(alt)),
        None => Some(point),
    }
}

/// Convert a (degrees, minutes, seconds) tuple to decimal degrees.
fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, negate: bool) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if negate {
        -decimal
    } else {
        decimal
    }
}

/// A Southern or Western hemisphere reference flips the sign.
fn hemisphere_negates(reference: &str) -> bool {
    matches!(reference, "S" | "W")
}

/// Extract one GPS coordinate (latitude or longitude) with its hemisphere
/// reference applied.
fn extract_gps_coordinate(
    exif: &exif::Exif,
    coord_tag: exif::Tag,
    ref_tag: exif::Tag,
) -> Option<f64> {
    let coord_field = exif.get_field(coord_tag, exif::In::PRIMARY)?;
    let ref_field = exif.get_field(ref_tag, exif::In::PRIMARY)?;

    let rationals = match &coord_field.value {
        exif::Value::Rational(r) => r,
        _ => return None,
    };

    // Stored as [degrees, minutes, seconds].
    if rationals.len() < 3 {
        return None;
    }

    let reference = ascii_value(&ref_field.value)?;
    Some(dms_to_decimal(
        rationals[0].to_f64(),
        rationals[1].to_f64(),
        rationals[2].to_f64(),
        hemisphere_negates(reference.trim()),
    ))
}

/// Extract GPS altitude, negated when the reference byte indicates below
/// sea level.
fn extract_gps_altitude(exif: &exif::Exif) -> Option<f64> {
    let alt_field = exif.get_field(exif::Tag::GPSAltitude, exif::In::PRIMARY)?;

    let altitude = match &alt_field.value {
        exif::Value::Rational(r) if !r.is_empty() => r[0].to_f64(),
        _ => return None,
    };

    let below_sea_level = exif
        .get_field(exif::Tag::GPSAltitudeRef, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        == Some(1);

    Some(if below_sea_level { -altitude } else { altitude })
}

/// Raw ASCII tag contents, verbatim apart from trimming padding.
fn extract_ascii_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    let text = ascii_value(&field.value)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn ascii_value(value: &exif::Value) -> Option<String> {
    match value {
        exif::Value::Ascii(v) if !v.is_empty() => {
            Some(String::from_utf8_lossy(&v[0]).into_owned())
        }
        _ => None,
    }
}

fn extract_u32_field(exif: &exif::Exif, tag: exif::Tag) -> Option<u32> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

fn extract_rational_field(exif: &exif::Exif, tag: exif::Tag) -> Option<f64> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match &field.value {
        exif::Value::Rational(r) if !r.is_empty() => Some(r[0].to_f64()),
        _ => None,
    }
}
