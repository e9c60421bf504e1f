//! Type conversion functions for the cleaning steps.
//!
//! Every converter is lenient: a cell that cannot be converted becomes null
//! and the caller decides whether that means impute, drop or fail.

use crate::utils::{is_numeric_dtype, parse_finite_f64, strip_chars, to_string_series};
use polars::prelude::*;

/// Coerce a column to Float64, stripping `strip` characters from text cells
/// first. Returns the converted Series and how many cells ended up null.
pub(crate) fn coerce_to_f64(series: &Series, strip: &[char]) -> PolarsResult<(Series, usize)> {
    let values: Vec<Option<f64>> = if is_numeric_dtype(series.dtype()) {
        let float_series = series.cast(&DataType::Float64)?;
        float_series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect()
    } else {
        let str_series = to_string_series(series)?;
        str_series
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| parse_finite_f64(&strip_chars(s, strip))))
            .collect()
    };

    let missing = values.iter().filter(|v| v.is_none()).count();
    Ok((Series::new(series.name().clone(), values), missing))
}

/// Coerce a column to Int64 years. Fractional values are truncated toward
/// zero; anything unparseable becomes null.
pub(crate) fn coerce_to_year(series: &Series) -> PolarsResult<Series> {
    let (floats, _) = coerce_to_f64(series, &[])?;
    let years: Vec<Option<i64>> = floats
        .f64()?
        .into_iter()
        .map(|v| v.map(|year| year.trunc() as i64))
        .collect();
    Ok(Series::new(series.name().clone(), years))
}

/// Replace nulls in a Float64 Series with `fill_value`.
pub(crate) fn fill_f64_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    Ok(series.f64()?.fill_null_with_values(fill_value)?.into_series())
}

/// Replace nulls in any Series with `fill_value`, producing a String Series.
pub(crate) fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = to_string_series(series)?;
    let values: Vec<&str> = str_series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}
