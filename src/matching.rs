//! Fuzzy string similarity — whole-string and best-substring ratios.
//!
//! Scores are integers in 0..=100. Callers own the normalization policy
//! (the scoring engine lowercases before comparing; identifier comparisons
//! go digit-only via [`digit_ratio`]).

/// Minimum score for a match to appear in the audit trail.
///
/// Raw scores below this still feed the composite calculation; the
/// threshold only gates audit-trail inclusion.
pub const ACCEPT_THRESHOLD: u32 = 70;

/// Whole-string similarity, 0..=100.
///
/// Normalized Levenshtein similarity scaled to an integer percentage.
pub fn ratio(a: &str, b: &str) -> u32 {
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u32
}

/// Best-aligned substring similarity, 0..=100.
///
/// Slides a window the length of the shorter string across the longer one
/// and returns the best whole-string [`ratio`] over all windows. Used when
/// one string is expected to be embedded in a longer text (e.g. a name
/// inside a salutation line).
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = short.chars().count();
    if short_len == 0 {
        // Matches ratio("", "") semantics: empty vs empty is a perfect match.
        return if long.is_empty() { 100 } else { 0 };
    }

    let long_chars: Vec<char> = long.chars().collect();
    if long_chars.len() == short_len {
        return ratio(short, long);
    }

    let mut best = 0;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(short, &candidate));
        if best == 100 {
            break;
        }
    }
    best
}

/// Strip all non-digit characters.
pub fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Digit-only similarity — both sides stripped to digits before comparison.
///
/// Used for phone numbers and other numeric identifiers where formatting
/// characters must not affect the score.
pub fn digit_ratio(a: &str, b: &str) -> u32 {
    ratio(&digits(a), &digits(b))
}
