//! Gross outlier view.
//!
//! Builds an analysis copy of the enriched table with gross outliers removed
//! by the IQR rule and a log-scaled gross column added. The enriched table
//! itself is never modified.

use crate::cleaner::coerce_to_f64;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::utils::{has_column, quantile_sorted, require_series};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Bounds and row counts of one outlier pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    pub rows_kept: usize,
    pub rows_removed: usize,
}

/// Filters gross outliers with the IQR rule.
pub struct GrossOutlierFilter<'a> {
    config: &'a PipelineConfig,
}

impl<'a> GrossOutlierFilter<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Keep rows with gross inside `[Q1 - k*IQR, Q3 + k*IQR]` and add
    /// `ln(1 + gross)`.
    ///
    /// Rows with missing gross are not in the view. When no gross value is
    /// present the view is empty and the summary is `None`.
    pub fn apply(&self, df: &DataFrame) -> Result<(DataFrame, Option<OutlierSummary>)> {
        let gross_name = self.config.columns.gross.as_str();
        let log_name = self.config.columns.log_gross.as_str();

        if !has_column(df, gross_name) {
            debug!("No '{}' column; outlier view is empty", gross_name);
            return Ok((df.head(Some(0)), None));
        }

        let (gross, _) = coerce_to_f64(require_series(df, gross_name)?, &[])?;
        let gross: Vec<Option<f64>> = gross.f64()?.into_iter().collect();

        let mut sorted: Vec<f64> = gross.iter().flatten().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let (Some(q1), Some(q3)) = (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75))
        else {
            debug!("'{}' has no values; outlier view is empty", gross_name);
            return Ok((df.head(Some(0)), None));
        };

        let k = self.config.iqr_multiplier;
        let iqr = q3 - q1;
        let lower = q1 - k * iqr;
        let upper = q3 + k * iqr;

        let keep: Vec<bool> = gross
            .iter()
            .map(|v| v.is_some_and(|v| v >= lower && v <= upper))
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        let mut view = df.filter(&mask)?;

        let log_gross: Vec<Option<f64>> = gross
            .iter()
            .zip(&keep)
            .filter(|(_, kept)| **kept)
            .map(|(v, _)| v.map(f64::ln_1p))
            .collect();
        view.with_column(Series::new(log_name.into(), log_gross))?;

        let summary = OutlierSummary {
            q1,
            q3,
            lower,
            upper,
            rows_kept: view.height(),
            rows_removed: df.height() - view.height(),
        };
        info!(
            "Outlier view: kept {} rows, removed {} ('{}' outside [{:.2}, {:.2}])",
            summary.rows_kept, summary.rows_removed, gross_name, lower, upper
        );

        Ok((view, Some(summary)))
    }
}
