//! Text normalization for hand-typed tracklist lines.
//!
//! Three stages, applied in this order by the parser:
//! - `normalize_text`: mojibake repair, diacritic folding, dash/space rewriting, ASCII-only output
//! - `strip_prefix`: timestamps, bullets and list numbering in front of the music
//! - `strip_label`: trailing record-label brackets that carry no version info

use any_ascii::any_ascii_char;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// VERSION KEYWORDS
// ============================================================================

/// Words that mark a bracket or dash suffix as version information rather than
/// label metadata. Matched as case-insensitive substrings.
pub const VERSION_KEYWORDS: [&str; 11] = [
    "remix", "rmx", "bootleg", "edit", "vip", "dub", "dubplate", "mix", "cut", "version",
    "rework",
];

/// True if `s` contains any of `VERSION_KEYWORDS` (case-insensitive).
pub fn contains_version_keyword(s: &str) -> bool {
    let lower = s.to_lowercase();
    VERSION_KEYWORDS.iter().any(|k| lower.contains(k))
}

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Runs of whitespace, collapsed to a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cheap pre-check before attempting a Windows-1252 round trip.
/// UTF-8 lead bytes 0xC2-0xC3 and 0xE2 show up as "Â", "Ã", "â" when misdecoded.
static MOJIBAKE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ÂÃâ][\u{80}-\u{BF}\u{152}-\u{2122}]").unwrap());

/// Prefix cleanup patterns (applied in order, each at most once).
/// Input is `normalize_text` output, so only ASCII bullets and dashes are listed.
/// Earlier removals must not defeat later ones: bullets hide timestamps,
/// numbering hides timestamps, timestamps leave separators behind.
pub static PREFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Bullets and list markers: "* ", "- ", "> ", leading "w/ "
        Regex::new(r"^\s*(?:(?:[*+>~#|]+|-+\s|(?i:w/))\s*)+").unwrap(),
        // Bracketed timestamps: "[1:02:03]", "[43:37]", "(0:12)"
        Regex::new(r"^[\[(]\s*\d{1,2}(?::\d{2}){1,2}\s*[\])]\s*").unwrap(),
        // Numbered lists: "3. ", "12) "
        Regex::new(r"^\d{1,3}[.)]\s+").unwrap(),
        // Time ranges: "01:00 to 01:04 :", "1:00:00 TO 1:03:30"
        Regex::new(r"(?i)^\d{1,2}:\d{2}(?::\d{2})?\s*to\s*\d{1,2}:\d{2}(?::\d{2})?\s*:?\s*").unwrap(),
        // Bare timestamps: "1:02:03 ", "0:12 ", "43:37"
        Regex::new(r"^\d{1,2}:\d{2}(?::\d{2})?\s*").unwrap(),
        // Separators left behind by the timestamp: "- ", ": ", "w/ "
        Regex::new(r"^(?:[\s\-:]|(?i:w/))+").unwrap(),
    ]
});

/// A single trailing "(...)" or "[...]" segment
static TRAILING_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[\(\[]([^\(\)\[\]]*)[\)\]]\s*$").unwrap());

// ============================================================================
// MOJIBAKE REPAIR
// ============================================================================

/// Windows-1252 characters for bytes 0x80..=0x9F (None where the byte is undefined)
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Common sequences, used when the whole-string round trip fails
/// (e.g. a line mixing correct and misdecoded text).
const MOJIBAKE_SEQUENCES: [(&str, &str); 22] = [
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9D}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("â€¢", "\u{2022}"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã¡", "á"),
    ("Ã³", "ó"),
    ("Ã­", "í"),
    ("Ã±", "ñ"),
    ("Ã§", "ç"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("Ã¤", "ä"),
    ("Ã¸", "ø"),
    ("Ã˜", "Ø"),
    ("Ãœ", "Ü"),
    ("Â\u{A0}", " "),
];

fn cp1252_byte(c: char) -> Option<u8> {
    let cp = c as u32;
    if cp <= 0xFF {
        return Some(cp as u8);
    }
    CP1252_HIGH
        .iter()
        .position(|&h| h == Some(c))
        .map(|i| 0x80 + i as u8)
}

/// Undo UTF-8 text that was decoded as Windows-1252/Latin-1.
/// e.g., "Ã˜ostre" → "Øostre", "Donâ€™t" → "Don’t"
pub fn repair_mojibake(s: &str) -> String {
    if !MOJIBAKE_MARKER.is_match(s) {
        return s.to_string();
    }

    let bytes: Option<Vec<u8>> = s.chars().map(cp1252_byte).collect();
    if let Some(decoded) = bytes.and_then(|b| String::from_utf8(b).ok()) {
        return decoded;
    }

    let mut result = s.to_string();
    for (broken, fixed) in MOJIBAKE_SEQUENCES.iter() {
        result = result.replace(broken, fixed);
    }
    result
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Dash-like code points rewritten to ASCII '-'
pub fn is_dash(c: char) -> bool {
    matches!(
        c,
        '\u{2010}'..='\u{2015}' | '\u{2043}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}'
    )
}

/// Latin blocks whose leftovers after NFKD (ø, æ, ß, ł, đ) are transliterated
/// instead of dropped.
fn is_latin_letter_block(c: char) -> bool {
    matches!(c as u32, 0x00C0..=0x024F | 0x1E00..=0x1EFF)
}

/// Collapse whitespace runs to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    MULTI_SPACE.replace_all(s, " ").trim().to_string()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a raw line to clean ASCII.
///
/// Repairs mojibake, folds diacritics (NFKD, combining marks dropped),
/// rewrites dashes to '-' and unicode spaces to ' ', straightens quotes,
/// drops whatever non-ASCII is left and collapses whitespace.
/// Idempotent; never fails.
pub fn normalize_text(s: &str) -> String {
    let repaired = repair_mojibake(s);

    let mut out = String::with_capacity(repaired.len());
    for c in repaired.nfkd().filter(|c| !is_combining_mark(*c)) {
        match c {
            c if c.is_ascii() => out.push(c),
            c if is_dash(c) => out.push('-'),
            c if c.is_whitespace() => out.push(' '),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' | '\u{00B4}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            c if is_latin_letter_block(c) => {
                out.extend(any_ascii_char(c).chars().filter(|t| t.is_ascii()))
            }
            _ => {}
        }
    }

    collapse_whitespace(&out)
}

/// Strip timestamps, bullets, list numbering and leftover separators from the
/// front of an entry. Each rule is a no-op when its pattern is absent.
pub fn strip_prefix(s: &str) -> String {
    let mut result = s.trim().to_string();
    for pattern in PREFIX_PATTERNS.iter() {
        result = pattern.replace(&result, "").to_string();
    }
    result.trim().to_string()
}

/// Remove one trailing bracketed segment unless it holds a version keyword.
/// "Ecuador [HOSP123]" → "Ecuador", "Trip [Intro Edit]" is left alone.
pub fn strip_label(s: &str) -> String {
    if let Some(caps) = TRAILING_BRACKET.captures(s) {
        let content = caps.get(1).map_or("", |m| m.as_str());
        if !contains_version_keyword(content) {
            let start = caps.get(0).map_or(s.len(), |m| m.start());
            return s[..start].trim_end().to_string();
        }
    }
    s.to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_folds_diacritics() {
        assert_eq!(normalize_text("Røyksopp"), "Royksopp");
        assert_eq!(normalize_text("Motörhead"), "Motorhead");
        assert_eq!(normalize_text("Beyoncé"), "Beyonce");
        assert_eq!(normalize_text("Straße"), "Strasse");
    }

    #[test]
    fn test_normalize_text_dashes_and_spaces() {
        assert_eq!(normalize_text("Sub Focus – Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(normalize_text("Sub Focus — Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(normalize_text("Sub Focus \u{2212} Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(normalize_text("Sub\u{00A0}Focus\u{2003}-  Ecuador\t"), "Sub Focus - Ecuador");
    }

    #[test]
    fn test_normalize_text_repairs_mojibake() {
        assert_eq!(normalize_text("Donâ€™t Stop"), "Don't Stop");
        assert_eq!(normalize_text("MotÃ¶rhead"), "Motorhead");
        assert_eq!(normalize_text("Sub Focus â€“ Ecuador"), "Sub Focus - Ecuador");
    }

    #[test]
    fn test_normalize_text_drops_other_scripts() {
        assert_eq!(normalize_text("Artist ★ Title"), "Artist Title");
        assert_eq!(normalize_text("кино"), "");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_text_is_idempotent_and_ascii() {
        let samples = [
            "• 0:12 Sub Focus – Ecuador",
            "Ã˜ostre  \u{3000} Rødhåd — Söma (VIP)",
            "Donâ€™t ★ Stop\u{00A0}\u{00A0}Me",
            "   ",
            "日本語 - テスト",
            "Â\u{A0}Château",
        ];
        for s in samples {
            let once = normalize_text(s);
            assert!(once.is_ascii(), "non-ascii output for {:?}: {:?}", s, once);
            assert_eq!(normalize_text(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_strip_prefix_timestamps() {
        assert_eq!(strip_prefix("0:12 Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("1:02:03 Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("43:37 - Sub Focus - Desire"), "Sub Focus - Desire");
        assert_eq!(strip_prefix("[43:37] Sub Focus - Desire"), "Sub Focus - Desire");
        assert_eq!(strip_prefix("[1:02:03] - Sub Focus - Desire"), "Sub Focus - Desire");
    }

    #[test]
    fn test_strip_prefix_markers_and_numbering() {
        assert_eq!(strip_prefix("* Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("- Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("3. Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("* 12. 0:12 Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("w/ Benny L - Memories"), "Benny L - Memories");
        assert_eq!(strip_prefix("12:00 w/ Benny L - Memories"), "Benny L - Memories");
    }

    #[test]
    fn test_strip_prefix_after_unicode_cleanup() {
        // Unicode bullets are dropped and dashes folded before prefix rules run
        assert_eq!(strip_prefix(&normalize_text("• 0:12 Sub Focus - Ecuador")), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix(&normalize_text("[43:37] — Sub Focus – Desire")), "Sub Focus - Desire");
        assert_eq!(strip_prefix(&normalize_text("▪ 12:00 w/ Benny L – Memories")), "Benny L - Memories");
    }

    #[test]
    fn test_strip_prefix_time_range() {
        assert_eq!(strip_prefix("01:00 to 01:04 : Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("01:00 TO 01:04: Sub Focus - Ecuador"), "Sub Focus - Ecuador");
    }

    #[test]
    fn test_strip_prefix_noop() {
        assert_eq!(strip_prefix("Sub Focus - Ecuador"), "Sub Focus - Ecuador");
        assert_eq!(strip_prefix("Sub Focus - 10:00 Edit"), "Sub Focus - 10:00 Edit");
        assert_eq!(strip_prefix(""), "");
    }

    #[test]
    fn test_strip_label() {
        assert_eq!(strip_label("Sub Focus - Ecuador [HOSPITAL]"), "Sub Focus - Ecuador");
        assert_eq!(strip_label("Sub Focus - Ecuador (RAM Records)"), "Sub Focus - Ecuador");
        assert_eq!(strip_label("Sub Focus - Trip [Intro Edit]"), "Sub Focus - Trip [Intro Edit]");
        assert_eq!(strip_label("Sub Focus - Trip (VIP)"), "Sub Focus - Trip (VIP)");
        // Only the last bracket is considered
        assert_eq!(strip_label("A - B (Remix) [LABEL]"), "A - B (Remix)");
        assert_eq!(strip_label("A - B [LABEL] (Remix)"), "A - B [LABEL] (Remix)");
        assert_eq!(strip_label("No brackets"), "No brackets");
    }

    #[test]
    fn test_contains_version_keyword() {
        assert!(contains_version_keyword("Sub Focus Remix"));
        assert!(contains_version_keyword("RMX"));
        assert!(contains_version_keyword("Dubplate"));
        assert!(!contains_version_keyword("Hospital Records"));
    }
}
