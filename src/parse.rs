//! Entry parsing: cleaned line → artist, title, version, flags.
//!
//! The pipeline for one raw entry is
//! `normalize_text` → `strip_prefix` → `strip_label` → artist/title split →
//! version extraction.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::models::{EntryOrder, TracklistEntry};
use crate::normalize::{
    collapse_whitespace, contains_version_keyword, normalize_text, strip_label, strip_prefix,
};
use crate::segment::segment_entries;

/// Canonical artist/title separator
pub const ARTIST_TITLE_SEPARATOR: &str = " - ";

// ============================================================================
// Regex Patterns
// ============================================================================

/// Any "(...)" or "[...]" segment without nesting
static BRACKET_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\[]([^\(\)\[\]]*)[\)\]]").unwrap());

/// "<name> <keyword>" at the end of a version string: "Sub Focus Remix" → "Sub Focus"
static VERSION_ARTIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:remix|rmx|bootleg|edit|vip|dubplate|dub|mix|cut|version|rework)$").unwrap()
});

static VIP_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bvip\b").unwrap());

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    pub order: EntryOrder,
}

impl ParserOptions {
    pub fn title_first() -> Self {
        Self {
            order: EntryOrder::TitleFirst,
        }
    }
}

// ============================================================================
// Version Extraction
// ============================================================================

/// Title split into the part without version text and the version itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVersion {
    pub short_title: String,
    pub version: String,
    /// Every version segment removed from the title, `version` first
    pub stripped: Vec<String>,
}

impl ExtractedVersion {
    /// True if the short title or any removed version segment says VIP.
    pub fn mentions_vip(&self) -> bool {
        has_vip_word(&self.short_title) || self.stripped.iter().any(|s| has_vip_word(s))
    }
}

/// Ways a version can be written, tried in `VERSION_STRATEGIES` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStrategy {
    /// "Trip (Sub Focus Remix)", "Trip [VIP]"
    Bracket,
    /// "Trip - Sub Focus Remix"
    DashSuffix,
}

pub const VERSION_STRATEGIES: [VersionStrategy; 2] =
    [VersionStrategy::Bracket, VersionStrategy::DashSuffix];

impl VersionStrategy {
    pub fn extract(self, title: &str) -> Option<ExtractedVersion> {
        match self {
            VersionStrategy::Bracket => extract_bracket_version(title),
            VersionStrategy::DashSuffix => extract_dash_version(title),
        }
    }
}

/// First bracket holding a version keyword is the version. Every
/// keyword-bearing bracket is removed from the short title.
fn extract_bracket_version(title: &str) -> Option<ExtractedVersion> {
    let stripped: Vec<String> = BRACKET_SEGMENT
        .captures_iter(title)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|content| contains_version_keyword(content))
        .map(str::to_string)
        .collect();
    let version = stripped.first()?.clone();

    let short_title = BRACKET_SEGMENT.replace_all(title, |caps: &Captures| {
        let content = caps.get(1).map_or("", |m| m.as_str());
        if contains_version_keyword(content) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    Some(ExtractedVersion {
        short_title: collapse_whitespace(&short_title),
        version,
        stripped,
    })
}

/// Text after the last " - " is the version if it has a version keyword.
fn extract_dash_version(title: &str) -> Option<ExtractedVersion> {
    let idx = title.rfind(ARTIST_TITLE_SEPARATOR)?;
    let suffix = title[idx + ARTIST_TITLE_SEPARATOR.len()..].trim();
    if suffix.is_empty() || !contains_version_keyword(suffix) {
        return None;
    }
    Some(ExtractedVersion {
        short_title: title[..idx].trim().to_string(),
        version: suffix.to_string(),
        stripped: vec![suffix.to_string()],
    })
}

/// Run the strategies in order and return the first hit.
/// Without a version the short title is the whole title.
pub fn extract_version(title: &str) -> ExtractedVersion {
    VERSION_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.extract(title))
        .unwrap_or_else(|| ExtractedVersion {
            short_title: title.trim().to_string(),
            version: String::new(),
            stripped: Vec::new(),
        })
}

/// Remixer/editor named in a version string, or "" if there is none.
pub fn version_artist_of(version: &str) -> String {
    VERSION_ARTIST
        .captures(version.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

pub fn has_vip_word(s: &str) -> bool {
    VIP_WORD.is_match(s)
}

/// DJ convention for "not identified yet"
pub fn is_unidentified_title(title: &str) -> bool {
    let title = title.trim();
    title.is_empty() || title.eq_ignore_ascii_case("id")
}

// ============================================================================
// Entry Parsing
// ============================================================================

/// Split on the first " - ". No separator means the whole string is the title.
pub fn split_artist_title(s: &str, order: EntryOrder) -> (String, String) {
    match s.split_once(ARTIST_TITLE_SEPARATOR) {
        Some((left, right)) => match order {
            EntryOrder::ArtistFirst => (left.trim().to_string(), right.trim().to_string()),
            EntryOrder::TitleFirst => (right.trim().to_string(), left.trim().to_string()),
        },
        None => (String::new(), s.trim().to_string()),
    }
}

/// Parse one raw entry into a structured, unscored `TracklistEntry`.
pub fn parse_entry(raw: &str, options: &ParserOptions) -> TracklistEntry {
    let unicode_cleaned = normalize_text(raw);
    let prefix_cleaned = strip_label(&strip_prefix(&unicode_cleaned));

    let (artist, full_title) = split_artist_title(&prefix_cleaned, options.order);
    let extracted = extract_version(&full_title);
    // A VIP bracket behind another version bracket still counts
    let is_vip = extracted.mentions_vip();
    let ExtractedVersion {
        short_title,
        version,
        ..
    } = extracted;
    let version_artist = version_artist_of(&version);
    let is_unidentified = is_unidentified_title(&short_title);

    TracklistEntry {
        full_tracklist_entry: raw.to_string(),
        unicode_cleaned_entry: unicode_cleaned,
        prefix_cleaned_entry: prefix_cleaned,
        artist,
        short_title,
        full_title,
        version,
        version_artist,
        is_vip,
        is_unidentified,
        ..Default::default()
    }
}

/// Parsed entries of a tracklist with the unidentified ones removed.
#[derive(Debug, Clone, Default)]
pub struct ParsedTracklist {
    /// Kept entries, `order_index` numbered 0.. in play order
    pub entries: Vec<TracklistEntry>,
    pub raw_count: usize,
    pub unidentified_count: usize,
}

/// Segment and parse a whole raw tracklist.
pub fn parse_tracklist(raw: &str, options: &ParserOptions) -> ParsedTracklist {
    let raw_entries = segment_entries(raw);
    let raw_count = raw_entries.len();

    let mut entries: Vec<TracklistEntry> = raw_entries
        .iter()
        .map(|line| parse_entry(line, options))
        .filter(|entry| !entry.is_unidentified)
        .collect();
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.order_index = i;
    }

    ParsedTracklist {
        unidentified_count: raw_count - entries.len(),
        raw_count,
        entries,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> TracklistEntry {
        parse_entry(raw, &ParserOptions::default())
    }

    #[test]
    fn test_parse_timestamped_entry() {
        let e = parse("0:12 Sub Focus - Ecuador");
        assert_eq!(e.prefix_cleaned_entry, "Sub Focus - Ecuador");
        assert_eq!(e.artist, "Sub Focus");
        assert_eq!(e.short_title, "Ecuador");
        assert_eq!(e.full_title, "Ecuador");
        assert_eq!(e.version, "");
        assert!(!e.is_vip);
        assert!(!e.is_unidentified);
    }

    #[test]
    fn test_parse_vip_with_edit_bracket() {
        let e = parse("Sub Focus & Metrik - Trip (VIP) [Intro Edit]");
        assert_eq!(e.artist, "Sub Focus & Metrik");
        assert_eq!(e.short_title, "Trip");
        assert_eq!(e.full_title, "Trip (VIP) [Intro Edit]");
        // First keyword bracket wins
        assert_eq!(e.version, "VIP");
        assert!(e.is_vip);
        assert_eq!(e.version_artist, "");
    }

    #[test]
    fn test_parse_vip_behind_other_version_bracket() {
        let e = parse("Metrik - Freefall [Intro Edit] (VIP)");
        assert_eq!(e.short_title, "Freefall");
        assert_eq!(e.version, "Intro Edit");
        assert!(e.is_vip);
        assert_eq!(
            extract_version("Freefall [Intro Edit] (VIP)").stripped,
            vec!["Intro Edit".to_string(), "VIP".to_string()]
        );
    }

    #[test]
    fn test_parse_remix_artist() {
        let e = parse("Dimension - Desire (Sub Focus Remix) [RAM]");
        assert_eq!(e.prefix_cleaned_entry, "Dimension - Desire (Sub Focus Remix)");
        assert_eq!(e.short_title, "Desire");
        assert_eq!(e.version, "Sub Focus Remix");
        assert_eq!(e.version_artist, "Sub Focus");
        assert!(!e.is_vip);
    }

    #[test]
    fn test_parse_dash_version() {
        let e = parse("Dimension - Desire - Sub Focus Remix");
        assert_eq!(e.artist, "Dimension");
        assert_eq!(e.full_title, "Desire - Sub Focus Remix");
        assert_eq!(e.short_title, "Desire");
        assert_eq!(e.version, "Sub Focus Remix");
        assert_eq!(e.version_artist, "Sub Focus");
    }

    #[test]
    fn test_parse_dash_without_keyword_is_title() {
        let e = parse("Artist - Part One - Part Two");
        assert_eq!(e.short_title, "Part One - Part Two");
        assert_eq!(e.version, "");
    }

    #[test]
    fn test_parse_vip_in_title_word() {
        assert!(parse("Metrik - Freefall VIP").is_vip);
        assert!(!parse("Metrik - Vipers").is_vip);
    }

    #[test]
    fn test_parse_unidentified() {
        assert!(parse("ID - ID").is_unidentified);
        assert!(parse("12:00 Sub Focus - id").is_unidentified);
        assert!(parse("ID").is_unidentified);
        assert!(parse("0:00").is_unidentified);
        assert!(!parse("Sub Focus - Identity").is_unidentified);
    }

    #[test]
    fn test_parse_no_separator() {
        let e = parse("Ecuador");
        assert_eq!(e.artist, "");
        assert_eq!(e.short_title, "Ecuador");
    }

    #[test]
    fn test_parse_title_first() {
        let e = parse_entry("Ecuador - Sub Focus", &ParserOptions::title_first());
        assert_eq!(e.artist, "Sub Focus");
        assert_eq!(e.full_title, "Ecuador");
    }

    #[test]
    fn test_parse_unicode_noise() {
        let e = parse("• [1:02:03] Røyksopp – Eple");
        assert_eq!(e.unicode_cleaned_entry, "[1:02:03] Royksopp - Eple");
        assert_eq!(e.artist, "Royksopp");
        assert_eq!(e.short_title, "Eple");
        assert_eq!(e.full_tracklist_entry, "• [1:02:03] Røyksopp – Eple");
    }

    #[test]
    fn test_strategy_order_is_explicit() {
        // Bracket strategy alone
        assert_eq!(
            VersionStrategy::Bracket.extract("Trip (VIP) - Sub Focus Remix"),
            Some(ExtractedVersion {
                short_title: "Trip - Sub Focus Remix".to_string(),
                version: "VIP".to_string(),
                stripped: vec!["VIP".to_string()],
            })
        );
        // Dash strategy alone
        assert_eq!(
            VersionStrategy::DashSuffix.extract("Trip (VIP) - Sub Focus Remix"),
            Some(ExtractedVersion {
                short_title: "Trip (VIP)".to_string(),
                version: "Sub Focus Remix".to_string(),
                stripped: vec!["Sub Focus Remix".to_string()],
            })
        );
        // Combined: bracket first
        assert_eq!(extract_version("Trip (VIP) - Sub Focus Remix").version, "VIP");
        assert_eq!(VersionStrategy::Bracket.extract("Trip (Live)"), None);
    }

    #[test]
    fn test_version_artist_of() {
        assert_eq!(version_artist_of("Sub Focus Remix"), "Sub Focus");
        assert_eq!(version_artist_of("Hedex Bootleg"), "Hedex");
        assert_eq!(version_artist_of("VIP"), "");
        assert_eq!(version_artist_of("Remix"), "");
        assert_eq!(version_artist_of(""), "");
    }

    #[test]
    fn test_parse_tracklist_drops_unidentified() {
        let raw = "0:00 Sub Focus - Ecuador\n3:00 ID - ID\n\
                   43:37 - Sub Focus & Dimension - Desire w/ Subsonic - Ascend\n";
        let parsed = parse_tracklist(raw, &ParserOptions::default());
        assert_eq!(parsed.raw_count, 4);
        assert_eq!(parsed.unidentified_count, 1);
        let cleaned: Vec<&str> = parsed
            .entries
            .iter()
            .map(|e| e.prefix_cleaned_entry.as_str())
            .collect();
        assert_eq!(
            cleaned,
            vec![
                "Sub Focus - Ecuador",
                "Sub Focus & Dimension - Desire",
                "Subsonic - Ascend"
            ]
        );
        let indexes: Vec<usize> = parsed.entries.iter().map(|e| e.order_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_tracklist_empty() {
        let parsed = parse_tracklist("  \n ", &ParserOptions::default());
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.raw_count, 0);
    }
}
