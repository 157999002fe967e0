//! Fuzzy string similarity primitives (0-100 scale).
//!
//! All functions lowercase and collapse whitespace before comparing.
//! `ratio` is the normalized indel similarity `2 * LCS / (len_a + len_b)`,
//! the other scores are built on top of it.

use rustc_hash::FxHashSet;

use crate::normalize::collapse_whitespace;

/// Lowercase + whitespace collapse applied to every input
pub fn prepare(s: &str) -> String {
    collapse_whitespace(&s.to_lowercase())
}

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn raw_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Plain similarity of two strings. Two empty strings are identical (100).
pub fn ratio(a: &str, b: &str) -> f64 {
    raw_ratio(&prepare(a), &prepare(b))
}

/// Best `ratio` of the shorter string against any same-length window of the
/// longer one, including windows clipped at either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = prepare(a);
    let b = prepare(b);
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short: Vec<char> = short.chars().collect();
    let long: Vec<char> = long.chars().collect();

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let n = short.len();
    let mut best: f64 = 0.0;

    // Windows hanging off the left edge
    for end in 1..n {
        best = best.max(ratio_chars(&short, &long[..end.min(long.len())]));
    }
    // Full windows
    for start in 0..=(long.len() - n) {
        best = best.max(ratio_chars(&short, &long[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    // Windows hanging off the right edge
    for start in (long.len() - n + 1)..long.len() {
        best = best.max(ratio_chars(&short, &long[start..]));
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

/// Order-dependent similarity after sorting each side's tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = prepare(a);
    let b = prepare(b);
    raw_ratio(&sorted_tokens(&a).join(" "), &sorted_tokens(&b).join(" "))
}

/// Order-independent token-set similarity.
///
/// Shared tokens are compared against each side's full token set; one side's
/// tokens being a subset of the other's scores 100. Empty input scores 0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a = prepare(a);
    let b = prepare(b);
    let set_a: FxHashSet<&str> = a.split_whitespace().collect();
    let set_b: FxHashSet<&str> = b.split_whitespace().collect();

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let mut intersection: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let mut diff_ab: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let mut diff_ba: Vec<&str> = set_b.difference(&set_a).copied().collect();
    intersection.sort_unstable();
    diff_ab.sort_unstable();
    diff_ba.sort_unstable();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = intersection.join(" ");
    let combine = |diff: &[&str]| -> String {
        let rest = diff.join(" ");
        if sect.is_empty() {
            rest
        } else {
            format!("{} {}", sect, rest)
        }
    };
    let sect_ab = combine(&diff_ab);
    let sect_ba = combine(&diff_ba);

    let mut best = raw_ratio(&sect_ab, &sect_ba);
    if !sect.is_empty() {
        best = best
            .max(raw_ratio(&sect, &sect_ab))
            .max(raw_ratio(&sect, &sect_ba));
    }
    best
}

/// `1 - |la - lb| / max(la, lb)` over whitespace-collapsed char counts.
/// 1.0 when both are empty.
pub fn length_similarity(a: &str, b: &str) -> f64 {
    let la = collapse_whitespace(a).chars().count();
    let lb = collapse_whitespace(b).chars().count();
    let longest = la.max(lb);
    if longest == 0 {
        return 1.0;
    }
    1.0 - (la as f64 - lb as f64).abs() / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_ratio_basic() {
        assert!(close(ratio("Ecuador", "ecuador"), 100.0));
        assert!(close(ratio("", ""), 100.0));
        assert!(close(ratio("abc", ""), 0.0));
        // lcs("abcd", "abce") = 3 → 200 * 3 / 8
        assert!(close(ratio("abcd", "abce"), 75.0));
        assert!(close(ratio("Sub  Focus", "sub focus"), 100.0));
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert!(close(partial_ratio("Sub Focus", "Dimension - Desire (Sub Focus Remix)"), 100.0));
        assert!(close(partial_ratio("Dimension - Desire (Sub Focus Remix)", "sub focus"), 100.0));
        assert!(close(partial_ratio("", "anything"), 0.0));
        assert!(close(partial_ratio("", ""), 100.0));
        assert!(partial_ratio("Hedex", "Sub Focus - Ecuador") < 60.0);
    }

    #[test]
    fn test_partial_ratio_edge_windows() {
        // "xab" only overlaps the start of "abcdef"
        let score = partial_ratio("xab", "abcdef");
        assert!(score >= 80.0 - 1e-6, "got {}", score);
    }

    #[test]
    fn test_token_sort_ratio_ignores_order() {
        assert!(close(token_sort_ratio("Focus Sub", "sub focus"), 100.0));
        assert!(token_sort_ratio("Ecuador", "Ecuador VIP") < 100.0);
    }

    #[test]
    fn test_token_set_ratio() {
        assert!(close(token_set_ratio("Sub Focus", "Sub Focus"), 100.0));
        // Subset scores 100
        assert!(close(token_set_ratio("Sub Focus", "Sub Focus & Dimension"), 100.0));
        assert!(close(token_set_ratio("", "Sub Focus"), 0.0));
        let partial = token_set_ratio("Sub Focus - Ecuador", "Sub Focus - Tidal Wave");
        assert!(partial > 50.0 && partial < 100.0, "got {}", partial);
        assert!(token_set_ratio("Metrik", "Hedex") < 50.0);
    }

    #[test]
    fn test_length_similarity() {
        assert!(close(length_similarity("", ""), 1.0));
        assert!(close(length_similarity("abcd", "ab"), 0.5));
        assert!(close(length_similarity("a  b", "a b"), 1.0));
        assert!(close(length_similarity("abc", ""), 0.0));
    }

    #[test]
    fn test_scores_stay_in_range() {
        let pairs = [
            ("Sub Focus - Ecuador", "Sub Focus - Ecuador (VIP)"),
            ("a", "zzzzzzzz"),
            ("", ""),
            ("x y z", "z y x"),
        ];
        for (a, b) in pairs {
            for score in [
                ratio(a, b),
                partial_ratio(a, b),
                token_sort_ratio(a, b),
                token_set_ratio(a, b),
            ] {
                assert!((0.0..=100.0).contains(&score), "{} vs {} → {}", a, b, score);
            }
        }
    }
}
