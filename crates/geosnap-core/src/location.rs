//! Multi-source location synthesis.
//!
//! An upload can carry up to five location candidates: the camera's own
//! GPS fix, an accurate and a rough point parsed from a free-text
//! description, and an accurate and a rough point recovered from chat
//! history. Synthesis is a deterministic precedence rule over that fixed
//! order (the most direct physical evidence wins), never a statistical
//! fusion of sources.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// How precise a candidate is claimed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Accurate,
    Rough,
}

/// Which source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrigin {
    Exif,
    Description,
    History,
}

/// A single location candidate. Ephemeral: exists only during synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationCandidate {
    pub point: GeoPoint,
    pub precision: Precision,
    pub origin: CandidateOrigin,
}

/// The five fixed candidate slots, in priority order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    /// (1) Accurate point from the camera's own EXIF GPS fix.
    pub exif: Option<GeoPoint>,
    /// (2) Accurate point parsed from the free-text description.
    pub description_accurate: Option<GeoPoint>,
    /// (3) Rough point parsed from the same description.
    pub description_rough: Option<GeoPoint>,
    /// (4) Accurate point recovered from chat history.
    pub history_accurate: Option<GeoPoint>,
    /// (5) Rough point recovered from chat history.
    pub history_rough: Option<GeoPoint>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exif(mut self, point: Option<GeoPoint>) -> Self {
        self.exif = point;
        self
    }

    pub fn with_description(mut self, accurate: Option<GeoPoint>, rough: Option<GeoPoint>) -> Self {
        self.description_accurate = accurate;
        self.description_rough = rough;
        self
    }

    pub fn with_history(mut self, accurate: Option<GeoPoint>, rough: Option<GeoPoint>) -> Self {
        self.history_accurate = accurate;
        self.history_rough = rough;
        self
    }

    /// The populated candidates, highest priority first.
    pub fn candidates(&self) -> Vec<LocationCandidate> {
        let slots = [
            (self.exif, Precision::Accurate, CandidateOrigin::Exif),
            (
                self.description_accurate,
                Precision::Accurate,
                CandidateOrigin::Description,
            ),
            (
                self.description_rough,
                Precision::Rough,
                CandidateOrigin::Description,
            ),
            (
                self.history_accurate,
                Precision::Accurate,
                CandidateOrigin::History,
            ),
            (
                self.history_rough,
                Precision::Rough,
                CandidateOrigin::History,
            ),
        ];

        slots
            .into_iter()
            .filter_map(|(point, precision, origin)| {
                point.map(|point| LocationCandidate {
                    point,
                    precision,
                    origin,
                })
            })
            .collect()
    }

    /// Resolve the final location: the first present candidate in the
    /// fixed order. All slots absent yields `None`, a legitimate
    /// terminal outcome, not an error.
    pub fn synthesize(&self) -> Option<GeoPoint> {
        self.candidates().first().map(|c| c.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_exif_wins_over_everything() {
        let set = CandidateSet::new()
            .with_exif(Some(point(1.0, 1.0)))
            .with_description(Some(point(2.0, 2.0)), Some(point(3.0, 3.0)))
            .with_history(Some(point(4.0, 4.0)), Some(point(5.0, 5.0)));

        assert_eq!(set.synthesize(), Some(point(1.0, 1.0)));
    }

    #[test]
    fn test_description_accurate_beats_history_accurate() {
        // EXIF absent, description-accurate (1,2), history-accurate
        // (3,4): the description wins.
        let set = CandidateSet::new()
            .with_description(Some(point(1.0, 2.0)), None)
            .with_history(Some(point(3.0, 4.0)), None);

        assert_eq!(set.synthesize(), Some(point(1.0, 2.0)));
    }

    #[test]
    fn test_description_rough_beats_history() {
        let set = CandidateSet::new()
            .with_description(None, Some(point(3.0, 3.0)))
            .with_history(Some(point(4.0, 4.0)), Some(point(5.0, 5.0)));

        assert_eq!(set.synthesize(), Some(point(3.0, 3.0)));
    }

    #[test]
    fn test_history_accurate_beats_history_rough() {
        let set = CandidateSet::new().with_history(Some(point(4.0, 4.0)), Some(point(5.0, 5.0)));
        assert_eq!(set.synthesize(), Some(point(4.0, 4.0)));
    }

    #[test]
    fn test_history_rough_alone() {
        let set = CandidateSet::new().with_history(None, Some(point(5.0, 5.0)));
        assert_eq!(set.synthesize(), Some(point(5.0, 5.0)));
    }

    #[test]
    fn test_all_absent_yields_none() {
        assert_eq!(CandidateSet::new().synthesize(), None);
    }

    #[test]
    fn test_every_single_slot_resolves_to_itself() {
        let p = point(7.0, 8.0);
        let sets = [
            CandidateSet::new().with_exif(Some(p)),
            CandidateSet::new().with_description(Some(p), None),
            CandidateSet::new().with_description(None, Some(p)),
            CandidateSet::new().with_history(Some(p), None),
            CandidateSet::new().with_history(None, Some(p)),
        ];
        for set in sets {
            assert_eq!(set.synthesize(), Some(p));
        }
    }

    #[test]
    fn test_candidates_preserve_priority_order() {
        let set = CandidateSet::new()
            .with_description(Some(point(2.0, 2.0)), Some(point(3.0, 3.0)))
            .with_history(None, Some(point(5.0, 5.0)));

        let candidates = set.candidates();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].origin, CandidateOrigin::Description);
        assert_eq!(candidates[0].precision, Precision::Accurate);
        assert_eq!(candidates[1].precision, Precision::Rough);
        assert_eq!(candidates[2].origin, CandidateOrigin::History);
    }
}
