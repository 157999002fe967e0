//! Splitting a raw tracklist blob into candidate entry strings.
//!
//! Line oriented on purpose: setlists follow no single syntax, so this stage
//! only finds entry boundaries and leaves the noise to the cleaning stages.

/// Marker DJs use for a second track played over the first ("A - B w/ C - D")
pub const BLEND_MARKER: &str = "w/";

/// Split a raw tracklist into trimmed, non-empty entry strings in play order.
///
/// Besides newlines, `w/` starts a new entry when it begins a token and the
/// line already holds some text before it. A line that *starts* with `w/`
/// (after bullets, timestamps, etc.) stays one entry; the marker is removed
/// later by the prefix stripper.
pub fn segment_entries(raw: &str) -> Vec<String> {
    raw.lines()
        .flat_map(split_blends)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split one line on every blend marker that qualifies as a separator.
fn split_blends(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (pos, _) in line.match_indices(BLEND_MARKER) {
        if is_blend_separator(line, start, pos) {
            parts.push(&line[start..pos]);
            start = pos + BLEND_MARKER.len();
        }
    }
    parts.push(&line[start..]);
    parts
}

fn is_blend_separator(line: &str, segment_start: usize, pos: usize) -> bool {
    // Must begin a token: "Show/Tell" is not a blend
    let starts_token = line[..pos]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric());
    // Must follow real text in the current segment, not just "• " or "12:00 "
    let has_text_before = line[segment_start..pos].chars().any(|c| c.is_alphabetic());
    starts_token && has_text_before
}
