//! Per-cell text parsers for the derived columns.

use once_cell::sync::Lazy;
use regex::Regex;

// First run of ASCII digits, e.g. "142" in "142 min"
static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("Invalid regex: digit run"));

/// Minutes from free-form runtime text: the first maximal run of decimal
/// digits. `None` when the text has no digits or the run does not fit i64.
pub fn runtime_minutes(text: &str) -> Option<i64> {
    DIGIT_RUN
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Floor a year to the start of its decade (1994 → 1990).
pub fn decade_of(year: i64) -> i64 {
    year.div_euclid(10) * 10
}

/// Canonical form of a comma-separated genre list: entries trimmed, sorted
/// by byte order and rejoined with ", ".
///
/// Idempotent; empty entries are kept and sort first.
pub fn normalize_genre(genre: &str) -> String {
    let mut tokens: Vec<&str> = genre.split(',').map(str::trim).collect();
    tokens.sort();
    tokens.join(", ")
}

/// Number of comma-separated entries in a genre list.
pub fn count_genres(genre: &str) -> usize {
    genre.split(',').count()
}

/// Individual tokens of a normalized genre string.
///
/// Empty entries (from a cell such as `"Drama,"`) are kept and counted as
/// the empty genre.
pub fn genre_tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(", ")
}
