//! Import and refresh: parse a tracklist, score every entry, attach predictions.
//!
//! Confirmation is sticky. An entry with `confirmed_track_id` is never
//! re-parsed, re-scored or re-predicted by anything in this module.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::models::{ImportRequest, ImportStats, Track, Tracklist, TracklistEntry};
use crate::parse::{parse_entry, parse_tracklist, ParserOptions};
use crate::ranking::{apply_predictions, predict_candidates, rank_candidates, MatchCandidate, MatchOptions};
use crate::scoring::HIGH_CONFIDENCE_THRESHOLD;

/// Outcome of `ImportOrchestrator::refresh`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub rescored: usize,
    pub skipped_confirmed: usize,
    /// Re-parse disagreed with the stored entry count; stored parse fields were kept.
    pub fell_back: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOrchestrator {
    pub parser: ParserOptions,
    pub matching: MatchOptions,
}

impl ImportOrchestrator {
    pub fn new(parser: ParserOptions, matching: MatchOptions) -> Self {
        Self { parser, matching }
    }

    /// Build a tracklist from raw text and predict a match for each entry.
    pub fn import(&self, request: ImportRequest, catalog: &[Track]) -> (Tracklist, ImportStats) {
        let start = Instant::now();
        let mut tracklist = Tracklist::from_request(request);

        let parsed = parse_tracklist(&tracklist.tracklist_string, &self.parser);
        let mut stats = ImportStats {
            tracklists: 1,
            raw_entries: parsed.raw_count,
            unidentified_dropped: parsed.unidentified_count,
            entries: parsed.entries.len(),
            ..Default::default()
        };

        tracklist.tracklist_entries = parsed.entries;
        for entry in &mut tracklist.tracklist_entries {
            self.predict_entry(entry, catalog);
            record_prediction(&mut stats, entry);
        }

        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        info!(
            set_name = %tracklist.set_name,
            entries = stats.entries,
            dropped = stats.unidentified_dropped,
            predicted = stats.predicted,
            "imported tracklist"
        );
        (tracklist, stats)
    }

    /// Recompute predictions for an existing tracklist, e.g. after the
    /// catalog grew.
    ///
    /// The raw text is re-parsed and fields are copied back by position when
    /// the entry counts agree. Otherwise positions can't be trusted, so the
    /// stored parse fields are scored as they are.
    pub fn refresh(&self, tracklist: &mut Tracklist, catalog: &[Track]) -> RefreshReport {
        let reparsed = parse_tracklist(&tracklist.tracklist_string, &self.parser);
        let fell_back = reparsed.entries.len() != tracklist.tracklist_entries.len();
        if fell_back {
            warn!(
                set_name = %tracklist.set_name,
                stored = tracklist.tracklist_entries.len(),
                reparsed = reparsed.entries.len(),
                "entry count changed on re-parse, re-scoring stored entries"
            );
        }

        let mut report = RefreshReport {
            fell_back,
            ..Default::default()
        };

        for (i, entry) in tracklist.tracklist_entries.iter_mut().enumerate() {
            if entry.is_confirmed() {
                report.skipped_confirmed += 1;
                continue;
            }
            if !fell_back {
                entry.copy_parsed_fields(&reparsed.entries[i]);
            }
            self.predict_entry(entry, catalog);
            report.rescored += 1;
        }

        info!(
            set_name = %tracklist.set_name,
            rescored = report.rescored,
            skipped_confirmed = report.skipped_confirmed,
            "refreshed tracklist"
        );
        report
    }

    /// Attach ranked candidates above the prediction floor to one entry.
    /// Confirmed entries are left untouched.
    pub fn predict_entry(&self, entry: &mut TracklistEntry, catalog: &[Track]) {
        if entry.is_confirmed() {
            return;
        }
        let candidates = predict_candidates(entry, catalog, &self.matching);
        apply_predictions(entry, &candidates);
        debug!(
            order_index = entry.order_index,
            entry = %entry.prefix_cleaned_entry,
            predicted = ?entry.predicted_track_id,
            confidence = ?entry.predicted_track_confidence,
            "scored entry"
        );
    }

    /// Parse a single free-form entry and rank the catalog for it
    /// (search floor, so low-confidence candidates are kept).
    pub fn search_entry<'a>(
        &self,
        raw: &str,
        catalog: &'a [Track],
    ) -> (TracklistEntry, Vec<MatchCandidate<'a>>) {
        let entry = parse_entry(raw.trim(), &self.parser);
        let ranked = rank_candidates(&entry, catalog, self.matching.top_n, self.matching.search_floor);
        (entry, ranked)
    }
}

fn record_prediction(stats: &mut ImportStats, entry: &TracklistEntry) {
    if entry.is_confirmed() {
        stats.confirmed_skipped += 1;
        return;
    }
    match entry.predicted_track_confidence {
        Some(confidence) => {
            stats.predicted += 1;
            if confidence >= HIGH_CONFIDENCE_THRESHOLD {
                stats.high_confidence += 1;
            }
        }
        None => stats.unmatched += 1,
    }
}
