//! Ranking one entry against the whole catalog.
//!
//! Every track is scored (O(catalog) per entry, no index). Catalogs are
//! personal-library sized, so a linear scan is the cost model.

use serde::{Deserialize, Serialize};

use crate::models::{PredictedTrack, Track, TrackId, TracklistEntry};
use crate::scoring::{compute_features, predict_confidence, FeatureVector, PREDICTION_FLOOR, SEARCH_FLOOR};

/// Default number of candidates kept per entry
pub const DEFAULT_TOP_N: usize = 5;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub top_n: usize,
    /// Floor for ad-hoc ranking (single-entry search)
    pub search_floor: f64,
    /// Floor for candidates attached to imported entries
    pub prediction_floor: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            search_floor: SEARCH_FLOOR,
            prediction_floor: PREDICTION_FLOOR,
        }
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// A catalog track with its score for one entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate<'a> {
    pub track: &'a Track,
    pub confidence: f64,
    pub features: FeatureVector,
}

impl MatchCandidate<'_> {
    pub fn track_id(&self) -> TrackId {
        self.track.id
    }

    pub fn to_predicted(&self) -> PredictedTrack {
        PredictedTrack {
            track: self.track.clone(),
            confidence: self.confidence,
        }
    }
}

/// Score one track. Exposed for diagnostics.
pub fn score_track<'a>(entry: &TracklistEntry, track: &'a Track) -> MatchCandidate<'a> {
    let features = compute_features(entry, track);
    MatchCandidate {
        track,
        confidence: predict_confidence(&features),
        features,
    }
}

/// Rank the catalog for one entry.
///
/// Output is non-increasing in confidence. Equal confidences keep catalog
/// order (stable sort), so ties depend on the order the catalog was read in.
/// Only candidates with `confidence >= min_confidence` are kept, at most `top_n`.
pub fn rank_candidates<'a>(
    entry: &TracklistEntry,
    catalog: &'a [Track],
    top_n: usize,
    min_confidence: f64,
) -> Vec<MatchCandidate<'a>> {
    let mut scored: Vec<MatchCandidate<'a>> = catalog
        .iter()
        .map(|track| score_track(entry, track))
        .collect();

    scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    scored
        .into_iter()
        .filter(|c| c.confidence >= min_confidence)
        .take(top_n)
        .collect()
}

/// Candidates to attach to an imported entry (prediction floor applies).
pub fn predict_candidates<'a>(
    entry: &TracklistEntry,
    catalog: &'a [Track],
    options: &MatchOptions,
) -> Vec<MatchCandidate<'a>> {
    rank_candidates(entry, catalog, options.top_n, options.prediction_floor)
}

/// Write ranked candidates onto an entry: the best one becomes the prediction.
/// An empty list leaves the entry without a prediction.
pub fn apply_predictions(entry: &mut TracklistEntry, candidates: &[MatchCandidate<'_>]) {
    entry.clear_predictions();
    if let Some(best) = candidates.first() {
        entry.predicted_track_id = Some(best.track_id());
        entry.predicted_track_confidence = Some(best.confidence);
    }
    entry.predicted_tracks = candidates.iter().map(MatchCandidate::to_predicted).collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_entry, ParserOptions};

    fn entry(raw: &str) -> TracklistEntry {
        parse_entry(raw, &ParserOptions::default())
    }

    fn catalog() -> Vec<Track> {
        vec![
            Track::new(1, "Metrik", "Freefall"),
            Track::new(2, "Sub Focus", "Tidal Wave"),
            Track::new(3, "Sub Focus", "Ecuador"),
            Track::new(4, "Sub Focus", "Ecuador (VIP)"),
            Track::new(5, "Dimension", "Desire"),
            Track::new(6, "Subsonic", "Ascend"),
            Track::new(7, "Hedex", "Rave Song"),
        ]
    }

    #[test]
    fn test_exact_track_ranks_first() {
        let tracks = catalog();
        let ranked = rank_candidates(&entry("Sub Focus - Ecuador"), &tracks, DEFAULT_TOP_N, 0.0);
        assert_eq!(ranked[0].track_id(), 3);
        assert!(ranked[0].confidence > 0.9);
    }

    #[test]
    fn test_ranking_is_non_increasing() {
        let tracks = catalog();
        let ranked = rank_candidates(&entry("0:00 Sub Focus - Ecuador VIP"), &tracks, 10, 0.0);
        assert_eq!(ranked.len(), tracks.len());
        for pair in ranked.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_duplicate_gets_maximum_confidence() {
        let tracks = catalog();
        for track in &tracks {
            let query = entry(&track.display_string());
            let ranked = rank_candidates(&query, &tracks, tracks.len(), 0.0);
            let own = ranked.iter().find(|c| c.track_id() == track.id).unwrap();
            assert_eq!(own.confidence, ranked[0].confidence, "query {:?}", track);
        }
    }

    #[test]
    fn test_top_n_and_floor() {
        let tracks = catalog();
        let e = entry("Sub Focus - Ecuador");
        assert_eq!(rank_candidates(&e, &tracks, 2, 0.0).len(), 2);
        let confident = rank_candidates(&e, &tracks, 5, PREDICTION_FLOOR);
        assert!(confident.iter().all(|c| c.confidence >= PREDICTION_FLOOR));
        assert!(rank_candidates(&e, &tracks, 0, 0.0).is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let tracks = vec![
            Track::new(10, "Sub Focus", "Ecuador"),
            Track::new(11, "Sub Focus", "Ecuador"),
        ];
        let ranked = rank_candidates(&entry("Sub Focus - Ecuador"), &tracks, 5, 0.0);
        assert_eq!(ranked[0].track_id(), 10);
        assert_eq!(ranked[1].track_id(), 11);
    }

    #[test]
    fn test_apply_predictions() {
        let tracks = catalog();
        let mut e = entry("Sub Focus - Ecuador");
        let candidates = predict_candidates(&e, &tracks, &MatchOptions::default());
        apply_predictions(&mut e, &candidates);
        assert_eq!(e.predicted_track_id, Some(3));
        assert_eq!(e.predicted_tracks[0].track.name, "Ecuador");
        assert!(e.predicted_tracks.len() <= DEFAULT_TOP_N);

        apply_predictions(&mut e, &[]);
        assert_eq!(e.predicted_track_id, None);
        assert_eq!(e.predicted_track_confidence, None);
        assert!(e.predicted_tracks.is_empty());
    }

    #[test]
    fn test_no_confident_match() {
        let tracks = catalog();
        let e = entry("Completely Unknown - Nothing Alike Here");
        assert!(predict_candidates(&e, &tracks, &MatchOptions::default()).is_empty());
        assert!(rank_candidates(&e, &[], 5, 0.0).is_empty());
    }
}
