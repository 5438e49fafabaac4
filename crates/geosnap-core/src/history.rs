//! Chat-history lookback: recovering a prior known location.
//!
//! The storage layer returns a reverse-chronological snapshot of prior
//! interactions for a (session, account) pair; the recovery fold here is
//! pure so the precedence rule is testable in isolation from I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::location::Precision;

/// A prior interaction, read-only snapshot. Ordered most-recent-first by
/// the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    /// When the interaction happened.
    pub occurred_at: DateTime<Utc>,
    /// Location explicitly attached to the interaction itself.
    pub location: Option<GeoPoint>,
    /// Location carried by the image attached to the interaction, if any.
    pub attached_image_location: Option<GeoPoint>,
    /// The prompt text of the interaction.
    pub prompt: Option<String>,
}

/// A location recovered from history, with the precision it implies:
/// an entry's own location was stated directly (accurate), one inherited
/// from an attached image is indirect (rough).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveredLocation {
    pub point: GeoPoint,
    pub precision: Precision,
}

/// Scan entries most-recent-first and return the first known location.
///
/// At each entry the entry's own location takes precedence over the
/// attached image's location. No match across the whole window yields
/// `None`, not an error.
pub fn recover_location(entries: &[HistoryEntry]) -> Option<RecoveredLocation> {
    entries.iter().find_map(|entry| {
        if let Some(point) = entry.location {
            Some(RecoveredLocation {
                point,
                precision: Precision::Accurate,
            })
        } else {
            entry.attached_image_location.map(|point| RecoveredLocation {
                point,
                precision: Precision::Rough,
            })
        }
    })
}
