//! Scoring functions for tracklist matching.
//!
//! This module contains:
//! - The seven-dimension feature vector between an entry and a catalog track
//! - The fixed logistic-regression confidence model
//! - Confidence thresholds used by ranking and import

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::{Track, TracklistEntry};
use crate::parse::{extract_version, version_artist_of};
use crate::similarity::{length_similarity, partial_ratio, token_set_ratio, token_sort_ratio};

// ============================================================================
// Score Thresholds
// ============================================================================

/// Minimum confidence to attach a prediction to an entry.
/// Confidences cluster near 0 or 1; this is a "clearly not nothing" cutoff,
/// not a calibrated probability.
pub const PREDICTION_FLOOR: f64 = 0.1;

/// Default floor for plain ranking (keep everything)
pub const SEARCH_FLOOR: f64 = 0.0;

/// Predictions at or above this are counted as high confidence in stats
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.9;

// ============================================================================
// Structural Confidence
// ============================================================================

pub const STRUCTURE_CANONICAL: f64 = 1.0;
pub const STRUCTURE_LOOSE_DASH: f64 = 0.6;
pub const STRUCTURE_NONE: f64 = 0.2;

/// A dash next to whitespace that isn't the canonical " - "
static LOOSE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s[-–—]|[-–—]\s").unwrap());

/// How confident we are that the raw line was written as "artist - title".
pub fn structural_confidence(raw_entry: &str) -> f64 {
    if raw_entry.contains(" - ") {
        STRUCTURE_CANONICAL
    } else if LOOSE_DASH.is_match(raw_entry) {
        STRUCTURE_LOOSE_DASH
    } else {
        STRUCTURE_NONE
    }
}

// ============================================================================
// Feature Vector
// ============================================================================

/// Similarity features between one entry and one catalog track.
/// Field order is the model's input order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeatureVector {
    /// Token-set similarity, cleaned entry vs "{artist} - {name}" (0-100)
    pub global_token_set: f64,
    /// Token-set similarity, artist vs artist (0-100)
    pub artist_set: f64,
    /// Sorted-token similarity, entry full title vs track name (0-100)
    pub title_sort: f64,
    /// Remixer agreement in both directions (0-100)
    pub remix_crosscheck: f64,
    /// 1 when the entry and the track disagree about being a VIP
    pub vip_conflict: f64,
    /// 0.2, 0.6 or 1.0, see `structural_confidence`
    pub structural_conf: f64,
    /// Length ratio of cleaned entry vs candidate string (0-1)
    pub length_similarity: f64,
}

impl FeatureVector {
    pub const NAMES: [&'static str; 7] = [
        "global_token_set",
        "artist_set",
        "title_sort",
        "remix_crosscheck",
        "vip_conflict",
        "structural_conf",
        "length_similarity",
    ];

    pub fn to_array(&self) -> [f64; 7] {
        [
            self.global_token_set,
            self.artist_set,
            self.title_sort,
            self.remix_crosscheck,
            self.vip_conflict,
            self.structural_conf,
            self.length_similarity,
        ]
    }

    /// (name, value) pairs in model order, for diagnostics
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        Self::NAMES.iter().copied().zip(self.to_array()).collect()
    }

    /// Weighted sum with another vector of the same layout.
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

// ============================================================================
// Feature Computation
// ============================================================================

/// Remixer named on the catalog side, using the entry-side version rules.
fn track_version_artist(track: &Track) -> String {
    version_artist_of(&extract_version(&track.name).version)
}

/// 100 when the entry names no remixer. Otherwise both directions must agree:
/// the entry's remixer must appear in the candidate, and the candidate's
/// remixer must appear in the entry. The weaker direction is the score.
pub fn remix_crosscheck(entry: &TracklistEntry, track: &Track, candidate: &str) -> f64 {
    if entry.version_artist.is_empty() {
        return 100.0;
    }
    let forward = partial_ratio(&entry.version_artist, candidate);

    let entry_string = format!("{} - {}", entry.artist, entry.full_title);
    let backward = partial_ratio(&track_version_artist(track), &entry_string);

    forward.min(backward)
}

pub fn vip_conflict(entry: &TracklistEntry, track: &Track) -> f64 {
    let track_is_vip = track.name.to_lowercase().contains("vip");
    if entry.is_vip != track_is_vip {
        1.0
    } else {
        0.0
    }
}

/// Compute all seven features for an entry against one catalog track.
pub fn compute_features(entry: &TracklistEntry, track: &Track) -> FeatureVector {
    let candidate = track.display_string();

    FeatureVector {
        global_token_set: token_set_ratio(&entry.prefix_cleaned_entry, &candidate),
        artist_set: token_set_ratio(&entry.artist, &track.artist),
        title_sort: token_sort_ratio(&entry.full_title, &track.name),
        remix_crosscheck: remix_crosscheck(entry, track, &candidate),
        vip_conflict: vip_conflict(entry, track),
        structural_conf: structural_confidence(&entry.full_tracklist_entry),
        length_similarity: length_similarity(&entry.prefix_cleaned_entry, &candidate),
    }
}

// ============================================================================
// Confidence Model
// ============================================================================

/// Fixed logistic-regression model. Coefficients were fit offline and are
/// never updated at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceModel {
    pub weights: FeatureVector,
    pub intercept: f64,
}

pub const MATCH_MODEL: ConfidenceModel = ConfidenceModel {
    weights: FeatureVector {
        global_token_set: 0.12109217,
        artist_set: 0.00756299,
        title_sort: 0.03052661,
        remix_crosscheck: 0.04648941,
        vip_conflict: -2.92201963,
        structural_conf: 0.46852412,
        length_similarity: 0.34230782,
    },
    intercept: -17.97546162,
};

/// Sigmoid outputs are pinned inside the open interval (0, 1)
const CONFIDENCE_EPSILON: f64 = 1e-12;

impl ConfidenceModel {
    pub fn logit(&self, features: &FeatureVector) -> f64 {
        self.weights.dot(features) + self.intercept
    }

    /// Match confidence in (0, 1).
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let z = self.logit(features);
        let p = 1.0 / (1.0 + (-z).exp());
        p.clamp(CONFIDENCE_EPSILON, 1.0 - CONFIDENCE_EPSILON)
    }
}

/// Confidence of `features` under the built-in model.
pub fn predict_confidence(features: &FeatureVector) -> f64 {
    MATCH_MODEL.predict(features)
}

// ============================================================================
// TESTS
// ============================================================================
