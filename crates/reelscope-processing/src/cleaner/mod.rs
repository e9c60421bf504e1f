//! Data cleaning module for raw movie catalogs.
//!
//! The cleaner applies an ordered sequence of repairs, each one relying on
//! the invariants established by the steps before it:
//! 1. Certificate repair (missing → sentinel, no rows dropped)
//! 2. Gross parsing (strip separators, coerce, impute column-wide)
//! 3. Critical-field drop (genre, director, title, release year)
//! 4. Release-year parsing (unparseable → row dropped, survivors Int64)
//! 5. Title de-duplication (first occurrence wins)

mod converters;
mod sanitizers;

pub(crate) use converters::coerce_to_f64;

use crate::config::{GrossImputation, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::pipeline::progress::PipelineStage;
use crate::types::{ActionType, CleaningSummary, ProcessingAction};
use crate::utils::{has_column, null_counts, require_series, to_string_series};
use converters::{coerce_to_year, fill_f64_nulls, fill_string_nulls};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Data cleaner for the movie catalog.
///
/// Each step takes the table by value and returns the next table state;
/// the caller's data is never aliased.
pub struct DataCleaner<'a> {
    config: &'a PipelineConfig,
}

impl<'a> DataCleaner<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every cleaning step in order.
    pub fn clean(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        self.clean_with(df, summary, |_, _| {})
    }

    /// Run every cleaning step in order, invoking `on_step` after each one
    /// with the step that finished and the table it produced.
    pub fn clean_with<F>(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
        mut on_step: F,
    ) -> Result<DataFrame>
    where
        F: FnMut(PipelineStage, &DataFrame),
    {
        self.validate_input(&df)?;
        log_initial_missing(&df);

        let df = if self.config.normalize_missing_markers {
            self.normalize_markers(df, summary)?
        } else {
            df
        };
        on_step(PipelineStage::Validation, &df);

        let df = self.repair_certificates(df, summary)?;
        on_step(PipelineStage::CertificateRepair, &df);

        let df = self.parse_gross(df, summary)?;
        on_step(PipelineStage::GrossParsing, &df);

        let df = self.drop_missing_critical(df, summary)?;
        on_step(PipelineStage::CriticalFieldFilter, &df);

        let df = self.parse_release_year(df, summary)?;
        on_step(PipelineStage::ReleaseYearParsing, &df);

        let df = if self.config.deduplicate_titles {
            self.deduplicate_titles(df, summary)?
        } else {
            debug!("Skipping title de-duplication (disabled)");
            df
        };
        on_step(PipelineStage::Deduplication, &df);

        Ok(df)
    }

    /// Check that every required column is present.
    ///
    /// Certificate and gross may be absent; any other named column missing
    /// is a fatal precondition violation.
    pub fn validate_input(&self, df: &DataFrame) -> Result<()> {
        for name in self.config.columns.required() {
            if !has_column(df, name) {
                return Err(ProcessingError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Treat conventional missing markers in the text columns as nulls.
    pub fn normalize_markers(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let columns = self.config.columns.inputs();
        let (df, count) = sanitizers::normalize_missing_markers(df, &columns)?;

        summary.markers_normalized += count;
        if count > 0 {
            info!("Treated {} missing-marker cells as missing", count);
            summary.add_action(ProcessingAction::new(
                ActionType::MarkersNormalized,
                "dataset",
                format!("Treated {} missing-marker cells as missing", count),
            ));
        }
        Ok(df)
    }

    /// Step 1: replace missing certificates with the sentinel.
    ///
    /// An absent certificate column is created with every row set to the
    /// sentinel, so the cleaned table always carries one.
    pub fn repair_certificates(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let mut df = df;
        let name = self.config.columns.certificate.as_str();
        let sentinel = self.config.certificate_fill.as_str();

        let (filled, missing) = if has_column(&df, name) {
            let series = require_series(&df, name)?;
            let missing = series.null_count();
            (fill_string_nulls(series, sentinel)?, missing)
        } else {
            warn!(
                "Column '{}' absent; every row receives '{}'",
                name, sentinel
            );
            summary.add_warning(format!(
                "Column '{}' absent from input; filled with '{}'",
                name, sentinel
            ));
            let values = vec![sentinel; df.height()];
            (Series::new(name.into(), values), df.height())
        };
        df.with_column(filled)?;

        summary.certificates_filled += missing;
        if missing > 0 {
            info!("Filled {} missing '{}' values with '{}'", missing, name, sentinel);
            summary.add_action(
                ProcessingAction::new(
                    ActionType::SentinelFilled,
                    name,
                    format!("Filled {} missing values", missing),
                )
                .with_details(format!("sentinel: {}", sentinel)),
            );
        }
        Ok(df)
    }

    /// Step 2: parse gross to Float64 and impute what did not parse.
    ///
    /// The fill value is computed over the parseable values only. When no
    /// value parses the fill value is undefined, filling is skipped and the
    /// empty column is reported as a warning.
    pub fn parse_gross(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        let mut df = df;
        let name = self.config.columns.gross.as_str();

        let (parsed, missing) = if has_column(&df, name) {
            let series = require_series(&df, name)?;
            coerce_to_f64(series, &self.config.thousands_separators)?
        } else {
            warn!("Column '{}' absent; gross values are treated as missing", name);
            summary.add_warning(format!("Column '{}' absent from input", name));
            let values: Vec<Option<f64>> = vec![None; df.height()];
            (Series::new(name.into(), values), df.height())
        };
        summary.gross_missing += missing;

        let fill_value = match self.config.gross_imputation {
            GrossImputation::Median => parsed.median(),
            GrossImputation::Mean => parsed.mean(),
            GrossImputation::Zero => Some(0.0),
            GrossImputation::Keep => None,
        };

        let parsed = match fill_value {
            Some(value) if missing > 0 => {
                info!(
                    "Filled {} missing '{}' values with {:?}: {:.2}",
                    missing, name, self.config.gross_imputation, value
                );
                summary.gross_imputed += missing;
                summary.add_action(
                    ProcessingAction::new(
                        ActionType::ValueImputed,
                        name,
                        format!("Filled {} missing values", missing),
                    )
                    .with_details(format!(
                        "{:?} of {} parseable values: {:.2}",
                        self.config.gross_imputation,
                        parsed.len() - missing,
                        value
                    )),
                );
                fill_f64_nulls(&parsed, value)?
            }
            Some(_) => parsed,
            None if self.config.gross_imputation == GrossImputation::Keep => {
                debug!("Leaving {} missing '{}' values unfilled", missing, name);
                parsed
            }
            None => {
                warn!(
                    "Column '{}' has no parseable values; fill value undefined, imputation skipped",
                    name
                );
                summary.add_warning(format!(
                    "Column '{}' has no parseable values; {} missing values left unfilled",
                    name, missing
                ));
                parsed
            }
        };
        summary.gross_fill_value = fill_value;

        df.with_column(parsed)?;
        Ok(df)
    }

    /// Step 3: drop rows missing genre, director, title or (when
    /// `require_release_year` is set) release year, in one filter pass.
    pub fn drop_missing_critical(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let columns = &self.config.columns;
        let mut critical = vec![
            columns.genre.as_str(),
            columns.director.as_str(),
            columns.title.as_str(),
        ];
        if self.config.require_release_year {
            critical.push(columns.release_year.as_str());
        }

        let mut mask = BooleanChunked::full("mask".into(), true, df.height());
        for name in &critical {
            let series = require_series(&df, name)?;
            mask = &mask & &series.is_not_null();
        }

        let before = df.height();
        let df = df.filter(&mask)?;
        let dropped = before - df.height();

        summary.critical_rows_dropped += dropped;
        if dropped > 0 {
            info!(
                "Dropped {} rows missing a critical field ({})",
                dropped,
                critical.join(", ")
            );
            summary.add_action(ProcessingAction::new(
                ActionType::RowsDropped,
                "dataset",
                format!(
                    "Dropped {} rows missing one of: {}",
                    dropped,
                    critical.join(", ")
                ),
            ));
        }
        Ok(df)
    }

    /// Step 4: coerce release year to Int64 and drop rows where it fails.
    pub fn parse_release_year(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let mut df = df;
        let name = self.config.columns.release_year.as_str();

        let years = coerce_to_year(require_series(&df, name)?)?;
        let mask = years.is_not_null();
        df.with_column(years)?;

        let before = df.height();
        let df = df.filter(&mask)?;
        let dropped = before - df.height();

        summary.year_rows_dropped += dropped;
        if dropped > 0 {
            info!("Dropped {} rows with an unparseable '{}'", dropped, name);
            summary.add_action(ProcessingAction::new(
                ActionType::ParseFailureDropped,
                name,
                format!("Dropped {} rows that did not parse as a year", dropped),
            ));
        }
        Ok(df)
    }

    /// Step 5: drop rows whose title repeats an earlier one, keeping the
    /// first occurrence and the original row order.
    pub fn deduplicate_titles(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let name = self.config.columns.title.as_str();
        let titles = to_string_series(require_series(&df, name)?)?;

        let mut seen: HashSet<&str> = HashSet::with_capacity(titles.len());
        let keep: Vec<bool> = titles
            .str()?
            .into_iter()
            .map(|title| match title {
                Some(title) => seen.insert(title),
                None => true,
            })
            .collect();

        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        let before = df.height();
        let df = df.filter(&mask)?;
        let removed = before - df.height();

        summary.duplicates_removed += removed;
        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            info!("Removed {} duplicate titles ({:.1}%)", removed, pct);
            summary.add_action(ProcessingAction::new(
                ActionType::DuplicatesRemoved,
                name,
                format!("Removed {} duplicate titles ({:.1}%)", removed, pct),
            ));
        } else {
            debug!("No duplicate titles found");
        }
        Ok(df)
    }
}

fn log_initial_missing(df: &DataFrame) {
    info!("Initial missing values:");
    for (name, count) in null_counts(df) {
        info!("  {:<20} {}", name, count);
    }
}
