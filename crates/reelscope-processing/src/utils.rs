//! Shared utilities for the movie cleaning pipeline.
//!
//! This module contains helpers used across the cleaner, the feature
//! extractor and the insight computations.

use crate::error::{ProcessingError, Result};
use crate::types::RankedValue;
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check whether the table has a column with this name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Fetch a column as a materialized Series, or fail with `MissingColumn`.
pub fn require_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| ProcessingError::MissingColumn(name.to_string()))
}

/// View any Series as a String Series, casting non-string dtypes.
pub fn to_string_series(series: &Series) -> PolarsResult<Series> {
    if series.dtype() == &DataType::String {
        Ok(series.clone())
    } else {
        series.cast(&DataType::String)
    }
}

/// Null counts for every column, in column order.
pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count()))
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Remove every occurrence of the given characters.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(strip_chars("1,234,567", &[',']), "1234567");
/// ```
pub fn strip_chars(s: &str, chars: &[char]) -> String {
    s.chars().filter(|c| !chars.contains(c)).collect()
}

/// Parse a trimmed string as a finite f64.
///
/// Empty strings, non-numeric text and non-finite values ("inf", "NaN")
/// all yield `None`.
pub fn parse_finite_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Quantile of already sorted values using linear interpolation between the
/// closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Count occurrences and rank them by descending count.
///
/// Equal counts keep the order in which the values were first encountered,
/// so the result is deterministic for a given input order.
pub fn rank_by_frequency<I, S>(values: I) -> Vec<RankedValue>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        let entry = counts
            .entry(value.as_ref().to_string())
            .or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first_seen))| (value, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .map(|(value, count, _)| RankedValue::new(value, count))
        .collect()
}

/// The most frequent value, first-encountered on ties.
pub fn most_frequent<I, S>(values: I) -> Option<RankedValue>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    rank_by_frequency(values).into_iter().next()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_require_series_missing() {
        let df = df!("Genre" => &["Drama"]).unwrap();
        assert!(require_series(&df, "Genre").is_ok());
        assert!(matches!(
            require_series(&df, "Director"),
            Err(ProcessingError::MissingColumn(name)) if name == "Director"
        ));
        assert!(has_column(&df, "Genre"));
        assert!(!has_column(&df, "Director"));
    }

    #[test]
    fn test_strip_chars() {
        assert_eq!(strip_chars("1,234,567", &[',']), "1234567");
        assert_eq!(strip_chars("1 234_567", &[' ', '_']), "1234567");
        assert_eq!(strip_chars("$1,000", &[',']), "$1000");
    }

    #[test]
    fn test_parse_finite_f64() {
        assert_eq!(parse_finite_f64(" 42 "), Some(42.0));
        assert_eq!(parse_finite_f64("1234567"), Some(1234567.0));
        assert_eq!(parse_finite_f64("-3.5"), Some(-3.5));
        assert_eq!(parse_finite_f64(""), None);
        assert_eq!(parse_finite_f64("PG"), None);
        assert_eq!(parse_finite_f64("inf"), None);
        assert_eq!(parse_finite_f64("NaN"), None);
    }

    #[test]
    fn test_quantile_sorted() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(2.0));
        assert_eq!(quantile_sorted(&sorted, 0.75), Some(4.0));
        assert_eq!(quantile_sorted(&[1.0, 2.0], 0.25), Some(1.25));
        assert_eq!(quantile_sorted(&sorted, 1.5), None);
    }

    #[test]
    fn test_rank_by_frequency_tie_break() {
        let ranked = rank_by_frequency(["B", "A", "A", "B", "C"]);
        assert_eq!(
            ranked,
            vec![
                RankedValue::new("B", 2),
                RankedValue::new("A", 2),
                RankedValue::new("C", 1),
            ]
        );
    }

    #[test]
    fn test_most_frequent() {
        assert_eq!(
            most_frequent(vec!["x", "y", "y"]),
            Some(RankedValue::new("y", 2))
        );
        assert_eq!(most_frequent(Vec::<String>::new()), None);
    }

    #[test]
    fn test_null_counts() {
        let df = df!(
            "a" => &[Some(1), None, None],
            "b" => &[Some("x"), Some("y"), None]
        )
        .unwrap();
        assert_eq!(
            null_counts(&df),
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
    }
}
