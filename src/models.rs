//! Core data models for tracklist matching.
//!
//! This module contains the struct definitions and enums shared by the
//! parsing, scoring and import stages.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Catalog track identifier as handed to us by the library store.
pub type TrackId = i64;

// ============================================================================
// Catalog Models
// ============================================================================

/// Known track from the library catalog (read-only to this crate).
/// Only these three fields participate in scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub artist: String,
}

impl Track {
    pub fn new(id: TrackId, artist: &str, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            artist: artist.to_string(),
        }
    }

    /// Comparison string used by every catalog-side feature: "{artist} - {name}"
    pub fn display_string(&self) -> String {
        format!("{} - {}", self.artist, self.name)
    }
}

// ============================================================================
// Parsing Models
// ============================================================================

/// Which side of the " - " separator holds the artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrder {
    /// "Artist - Title" (the usual setlist convention)
    #[default]
    ArtistFirst,
    /// "Title - Artist"
    TitleFirst,
}

/// A candidate track attached to an entry for user review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictedTrack {
    pub track: Track,
    pub confidence: f64,
}

/// One structured line item parsed out of a raw tracklist.
///
/// ## Field groups
///
/// - `full_tracklist_entry`, `unicode_cleaned_entry`, `prefix_cleaned_entry`:
///   the raw line and its cleaning intermediates, kept for debugging and re-matching.
/// - `artist` .. `is_unidentified`: parsed fields, derived once from the raw line.
/// - `predicted_*`: recomputed on import and refresh.
/// - `confirmed_track_id`: user-set. Once present it is authoritative and the
///   entry is never re-parsed or re-scored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TracklistEntry {
    pub full_tracklist_entry: String,
    pub unicode_cleaned_entry: String,
    pub prefix_cleaned_entry: String,

    pub artist: String,
    pub short_title: String,
    pub full_title: String,
    pub version: String,
    pub version_artist: String,
    pub is_vip: bool,
    pub is_unidentified: bool,

    pub predicted_track_id: Option<TrackId>,
    pub predicted_track_confidence: Option<f64>,
    #[serde(default)]
    pub predicted_tracks: Vec<PredictedTrack>,

    pub confirmed_track_id: Option<TrackId>,
    pub order_index: usize,
}

impl TracklistEntry {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_track_id.is_some()
    }

    /// Mark `track_id` as the user-confirmed match.
    pub fn confirm(&mut self, track_id: TrackId) {
        self.confirmed_track_id = Some(track_id);
    }

    /// Confirmed track if any, otherwise the predicted one.
    pub fn effective_track_id(&self) -> Option<TrackId> {
        self.confirmed_track_id.or(self.predicted_track_id)
    }

    /// Drop all prediction fields (confirmation is left alone).
    pub fn clear_predictions(&mut self) {
        self.predicted_track_id = None;
        self.predicted_track_confidence = None;
        self.predicted_tracks.clear();
    }

    /// Copy the parsed fields of `other` onto this entry, keeping position,
    /// confirmation and predictions.
    pub fn copy_parsed_fields(&mut self, other: &TracklistEntry) {
        self.full_tracklist_entry = other.full_tracklist_entry.clone();
        self.unicode_cleaned_entry = other.unicode_cleaned_entry.clone();
        self.prefix_cleaned_entry = other.prefix_cleaned_entry.clone();
        self.artist = other.artist.clone();
        self.short_title = other.short_title.clone();
        self.full_title = other.full_title.clone();
        self.version = other.version.clone();
        self.version_artist = other.version_artist.clone();
        self.is_vip = other.is_vip;
        self.is_unidentified = other.is_unidentified;
    }
}

// ============================================================================
// Tracklist Models
// ============================================================================

/// Caller-supplied input for an import.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    pub set_name: String,
    pub tracklist_string: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Tracklist container: metadata, the raw text and its entries in play order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracklist {
    pub set_name: String,
    pub artist: Option<String>,
    pub rating: Option<f32>,
    pub image_url: Option<String>,
    pub folder_id: Option<i64>,
    pub tracklist_string: String,
    pub tracklist_entries: Vec<TracklistEntry>,
}

impl Tracklist {
    pub fn from_request(request: ImportRequest) -> Self {
        Self {
            set_name: request.set_name,
            artist: request.artist,
            rating: request.rating,
            image_url: request.image_url,
            folder_id: request.folder_id,
            tracklist_string: request.tracklist_string,
            tracklist_entries: Vec::new(),
        }
    }

    pub fn entry_mut(&mut self, order_index: usize) -> Option<&mut TracklistEntry> {
        self.tracklist_entries
            .iter_mut()
            .find(|e| e.order_index == order_index)
    }

    /// Confirm `track_id` for the entry at `order_index`.
    /// Returns false if no entry has that index.
    pub fn confirm_entry(&mut self, order_index: usize, track_id: TrackId) -> bool {
        match self.entry_mut(order_index) {
            Some(entry) => {
                entry.confirm(track_id);
                true
            }
            None => false,
        }
    }

    pub fn confirmed_count(&self) -> usize {
        self.tracklist_entries.iter().filter(|e| e.is_confirmed()).count()
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-import counters, merged across files by the CLI.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ImportStats {
    pub tracklists: usize,
    pub raw_entries: usize,
    pub unidentified_dropped: usize,
    pub entries: usize,

    pub predicted: usize,
    pub high_confidence: usize, // predictions >= HIGH_CONFIDENCE_THRESHOLD
    pub unmatched: usize,
    pub confirmed_skipped: usize,

    pub elapsed_seconds: f64,
}

impl ImportStats {
    /// Percentage of kept entries that received a prediction
    pub fn match_rate(&self) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            100.0 * self.predicted as f64 / self.entries as f64
        }
    }

    pub fn merge(&mut self, other: &ImportStats) {
        self.tracklists += other.tracklists;
        self.raw_entries += other.raw_entries;
        self.unidentified_dropped += other.unidentified_dropped;
        self.entries += other.entries;
        self.predicted += other.predicted;
        self.high_confidence += other.high_confidence;
        self.unmatched += other.unmatched;
        self.confirmed_skipped += other.confirmed_skipped;
        self.elapsed_seconds += other.elapsed_seconds;
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(order_index: usize) -> TracklistEntry {
        TracklistEntry {
            order_index,
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_track_prefers_confirmation() {
        let mut e = entry(0);
        assert_eq!(e.effective_track_id(), None);
        e.predicted_track_id = Some(7);
        assert_eq!(e.effective_track_id(), Some(7));
        e.confirm(3);
        assert_eq!(e.effective_track_id(), Some(3));
        assert!(e.is_confirmed());
    }

    #[test]
    fn test_confirm_entry_by_order_index() {
        let mut tracklist = Tracklist {
            tracklist_entries: vec![entry(0), entry(1)],
            ..Default::default()
        };
        assert!(tracklist.confirm_entry(1, 42));
        assert!(!tracklist.confirm_entry(5, 42));
        assert_eq!(tracklist.tracklist_entries[1].confirmed_track_id, Some(42));
        assert_eq!(tracklist.confirmed_count(), 1);
    }

    #[test]
    fn test_match_rate() {
        let stats = ImportStats {
            entries: 4,
            predicted: 3,
            ..Default::default()
        };
        assert!((stats.match_rate() - 75.0).abs() < 1e-9);
        assert_eq!(ImportStats::default().match_rate(), 0.0);
    }

    #[test]
    fn test_track_display_string() {
        let t = Track::new(1, "Sub Focus", "Ecuador");
        assert_eq!(t.display_string(), "Sub Focus - Ecuador");
    }

    #[test]
    fn test_track_deserializes_without_artist() {
        let t: Track = serde_json::from_str(r#"{"id": 5, "name": "Ecuador"}"#).unwrap();
        assert_eq!(t.artist, "");
    }
}
