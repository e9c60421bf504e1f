//! Missing-marker normalization for text columns.

use polars::prelude::*;
use std::collections::HashSet;
use once_cell::sync::Lazy;
use tracing::debug;

/// Cell contents that CSV producers conventionally use for "no value".
static MISSING_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

/// Whether a cell is one of the conventional missing markers.
///
/// Surrounding whitespace is ignored; matching is case-sensitive.
pub(crate) fn is_missing_marker(value: &str) -> bool {
    MISSING_MARKERS.contains(value.trim())
}

/// Replace missing markers with nulls in the named String columns.
///
/// Columns that are absent or not String-typed are left untouched. Returns
/// the new table and the number of cells that were nulled.
pub(crate) fn normalize_missing_markers(
    df: DataFrame,
    columns: &[&str],
) -> PolarsResult<(DataFrame, usize)> {
    let mut df = df;
    let mut total_replacements = 0;

    for col_name in columns {
        let Ok(col) = df.column(col_name) else {
            continue;
        };
        let series = col.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }

        let (cleaned, count) = replace_markers_with_null(series)?;
        if count > 0 {
            debug!("Marked {} cells in '{}' as missing", count, col_name);
            total_replacements += count;
            df.replace(col_name, cleaned)?;
        }
    }

    Ok((df, total_replacements))
}

fn replace_markers_with_null(series: &Series) -> PolarsResult<(Series, usize)> {
    let str_series = series.str()?;
    let mut cleaned_values: Vec<Option<&str>> = Vec::with_capacity(str_series.len());
    let mut replacement_count = 0;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) if is_missing_marker(val) => {
                cleaned_values.push(None);
                replacement_count += 1;
            }
            other => cleaned_values.push(other),
        }
    }

    Ok((
        Series::new(series.name().clone(), cleaned_values),
        replacement_count,
    ))
}
