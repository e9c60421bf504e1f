//! Summary tables over the enriched table.
//!
//! These are the aggregates a chart or report layer reads: mean rating per
//! decade, ranked genre and director counts, per-column descriptive
//! statistics and pairwise correlation matrices.

use crate::cleaner::coerce_to_f64;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::text::{genre_tokens, normalize_genre};
use crate::pipeline::outliers::GrossOutlierFilter;
use crate::types::RankedValue;
use crate::utils::{has_column, quantile_sorted, rank_by_frequency, require_series, to_string_series};
use polars::lazy::dsl::pearson_corr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean rating of the titles released in one decade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecadeRating {
    pub decade: i64,
    pub mean_rating: f64,
    pub titles: usize,
}

/// Descriptive statistics of one numeric column.
///
/// Every statistic is `None` when the column has no values; `std` also
/// needs at least two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Pairwise Pearson correlations; `values[i][j]` pairs `columns[i]` with
/// `columns[j]`. Undefined entries (fewer than two complete pairs, or zero
/// variance) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns, if both are in the matrix.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// All summary tables for one enriched table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTables {
    pub rating_by_decade: Vec<DecadeRating>,
    pub top_genres: Vec<RankedValue>,
    pub top_directors: Vec<RankedValue>,
    pub describe: Vec<ColumnStats>,
    pub correlation: CorrelationMatrix,
    /// Correlations over the gross outlier view, with log gross in place
    /// of gross. `None` when the view has no rows.
    pub outlier_view_correlation: Option<CorrelationMatrix>,
}

impl AnalysisTables {
    /// Compute every table. Columns absent from `df` are skipped.
    pub fn compute(df: &DataFrame, config: &PipelineConfig) -> Result<Self> {
        let columns = &config.columns;
        let numeric = present(
            df,
            [
                &columns.release_year,
                &columns.rating,
                &columns.runtime_minutes,
                &columns.gross,
                &columns.num_genres,
            ],
        );
        let correlated = present(
            df,
            [
                &columns.rating,
                &columns.runtime_minutes,
                &columns.gross,
                &columns.release_year,
            ],
        );

        let (view, outliers) = GrossOutlierFilter::new(config).apply(df)?;
        let outlier_view_correlation = match outliers {
            Some(_) => {
                let view_columns = present(
                    &view,
                    [
                        &columns.rating,
                        &columns.runtime_minutes,
                        &columns.log_gross,
                        &columns.release_year,
                    ],
                );
                Some(correlation_matrix(&view, &view_columns)?)
            }
            None => None,
        };

        let tables = Self {
            rating_by_decade: rating_by_decade(df, &columns.decade, &columns.rating)?,
            top_genres: top_genres(df, &columns.genre, config.top_n)?,
            top_directors: top_values(df, &columns.director, config.top_n)?,
            describe: describe(df, &numeric)?,
            correlation: correlation_matrix(df, &correlated)?,
            outlier_view_correlation,
        };
        debug!(
            "Computed analysis tables: {} decades, {} described columns",
            tables.rating_by_decade.len(),
            tables.describe.len()
        );
        Ok(tables)
    }
}

fn present<'a, const N: usize>(df: &DataFrame, names: [&'a String; N]) -> Vec<&'a str> {
    names
        .into_iter()
        .map(String::as_str)
        .filter(|name| has_column(df, name))
        .collect()
}

fn numeric_series(df: &DataFrame, name: &str) -> Result<Series> {
    let (values, _) = coerce_to_f64(require_series(df, name)?, &[])?;
    Ok(values)
}

fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(numeric_series(df, name)?.f64()?.into_iter().collect())
}

/// Mean rating per decade, ascending by decade. Rows missing either value
/// are skipped; an absent column yields an empty table.
pub fn rating_by_decade(df: &DataFrame, decade: &str, rating: &str) -> Result<Vec<DecadeRating>> {
    if !has_column(df, decade) || !has_column(df, rating) {
        return Ok(Vec::new());
    }

    let pairs = df!(
        "decade" => numeric_values(df, decade)?,
        "rating" => numeric_values(df, rating)?
    )?;
    let grouped = pairs
        .lazy()
        .filter(col("decade").is_not_null().and(col("rating").is_not_null()))
        .group_by([col("decade").cast(DataType::Int64)])
        .agg([
            col("rating").mean().alias("mean_rating"),
            col("rating").count().cast(DataType::UInt64).alias("titles"),
        ])
        .sort(["decade"], SortMultipleOptions::default())
        .collect()?;

    let decades = grouped.column("decade")?.as_materialized_series().i64()?;
    let means = grouped.column("mean_rating")?.as_materialized_series().f64()?;
    let titles = grouped.column("titles")?.as_materialized_series().u64()?;

    Ok(decades
        .into_iter()
        .zip(means)
        .zip(titles)
        .filter_map(|((decade, mean_rating), titles)| {
            Some(DecadeRating {
                decade: decade?,
                mean_rating: mean_rating?,
                titles: titles? as usize,
            })
        })
        .collect())
}

/// The `n` most frequent genre tokens.
pub fn top_genres(df: &DataFrame, genre: &str, n: usize) -> Result<Vec<RankedValue>> {
    if !has_column(df, genre) {
        return Ok(Vec::new());
    }
    let genres = to_string_series(require_series(df, genre)?)?;
    let normalized: Vec<String> = genres.str()?.into_iter().flatten().map(normalize_genre).collect();

    let mut ranked = rank_by_frequency(normalized.iter().flat_map(|g| genre_tokens(g)));
    ranked.truncate(n);
    Ok(ranked)
}

/// The `n` most frequent values of a text column.
pub fn top_values(df: &DataFrame, column: &str, n: usize) -> Result<Vec<RankedValue>> {
    if !has_column(df, column) {
        return Ok(Vec::new());
    }
    let values = to_string_series(require_series(df, column)?)?;
    let mut ranked = rank_by_frequency(values.str()?.into_iter().flatten());
    ranked.truncate(n);
    Ok(ranked)
}

/// Count, mean, sample standard deviation, min, quartiles and max of each
/// named column, ignoring missing values.
pub fn describe(df: &DataFrame, columns: &[&str]) -> Result<Vec<ColumnStats>> {
    columns
        .iter()
        .map(|name| {
            let values = numeric_series(df, name)?;
            let values = values.f64()?;

            let mut sorted: Vec<f64> = values.into_iter().flatten().collect();
            sorted.sort_by(f64::total_cmp);

            Ok(ColumnStats {
                column: name.to_string(),
                count: sorted.len(),
                mean: values.mean(),
                std: values.std(1).filter(|std| std.is_finite()),
                min: values.min(),
                q25: quantile_sorted(&sorted, 0.25),
                median: values.median(),
                q75: quantile_sorted(&sorted, 0.75),
                max: values.max(),
            })
        })
        .collect()
}

/// Pairwise Pearson correlation over rows where both values are present.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| numeric_values(df, name))
        .collect::<Result<_>>()?;

    let values = data
        .iter()
        .map(|a| data.iter().map(|b| pearson(a, b)).collect::<Result<_>>())
        .collect::<Result<_>>()?;

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Result<Option<f64>> {
    let pairs = df!("x" => a, "y" => b)?
        .lazy()
        .filter(col("x").is_not_null().and(col("y").is_not_null()))
        .collect()?;
    if pairs.height() < 2 {
        return Ok(None);
    }

    let r = pairs
        .lazy()
        .select([pearson_corr(col("x"), col("y")).alias("r")])
        .collect()?;
    let r = r.column("r")?.as_materialized_series().f64()?.get(0);

    // zero variance yields NaN
    Ok(r.filter(|r| r.is_finite()).map(|r| r.clamp(-1.0, 1.0)))
}
