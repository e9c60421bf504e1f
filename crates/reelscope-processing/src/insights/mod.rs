//! Aggregate lookups over the enriched table.
//!
//! Every lookup tolerates an empty table or an empty column and reports the
//! result as unavailable instead of failing. Ties resolve to the first row
//! (or first-encountered value) in table order.

pub mod statistics;

pub use statistics::{AnalysisTables, ColumnStats, CorrelationMatrix, DecadeRating};

use crate::cleaner::coerce_to_f64;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::text::{genre_tokens, normalize_genre};
use crate::types::{Insights, RankedValue, TopGrossing};
use crate::utils::{has_column, most_frequent, require_series, to_string_series};
use polars::prelude::*;
use tracing::{info, warn};

/// Computes the [`Insights`] record.
pub struct InsightExtractor<'a> {
    config: &'a PipelineConfig,
}

impl<'a> InsightExtractor<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Compute all three lookups.
    pub fn compute(&self, df: &DataFrame) -> Result<Insights> {
        let insights = Insights {
            top_grossing: self.top_grossing(df)?,
            most_common_genre: self.most_common_genre(df)?,
            most_common_director: self.most_common_director(df)?,
        };

        if let Some(top) = &insights.top_grossing {
            info!("Top grossing: {} ({:.0})", top.title, top.gross);
        }
        if let Some(genre) = &insights.most_common_genre {
            info!("Most common genre: {} ({} titles)", genre.value, genre.count);
        }
        if let Some(director) = &insights.most_common_director {
            info!(
                "Most common director: {} ({} titles)",
                director.value, director.count
            );
        }
        for lookup in insights.unavailable() {
            warn!("Insight '{}' unavailable: no eligible rows", lookup);
        }

        Ok(insights)
    }

    /// Row with the largest gross; the first one wins ties.
    ///
    /// A missing gross column counts as an empty one.
    pub fn top_grossing(&self, df: &DataFrame) -> Result<Option<TopGrossing>> {
        let columns = &self.config.columns;
        if !has_column(df, &columns.gross) {
            return Ok(None);
        }

        let (gross, _) = coerce_to_f64(require_series(df, &columns.gross)?, &[])?;
        let titles = to_string_series(require_series(df, &columns.title)?)?;

        let mut best: Option<(usize, f64)> = None;
        for (row, value) in gross.f64()?.into_iter().enumerate() {
            let Some(value) = value else { continue };
            if best.is_none_or(|(_, max)| value > max) {
                best = Some((row, value));
            }
        }

        let Some((row, gross)) = best else {
            return Ok(None);
        };
        Ok(titles.str()?.get(row).map(|title| TopGrossing {
            title: title.to_string(),
            gross,
        }))
    }

    /// Most frequent genre token after exploding the normalized genre lists.
    pub fn most_common_genre(&self, df: &DataFrame) -> Result<Option<RankedValue>> {
        let genres = to_string_series(require_series(df, &self.config.columns.genre)?)?;
        let normalized: Vec<String> = genres.str()?.into_iter().flatten().map(normalize_genre).collect();
        Ok(most_frequent(normalized.iter().flat_map(|g| genre_tokens(g))))
    }

    /// Most frequent director.
    pub fn most_common_director(&self, df: &DataFrame) -> Result<Option<RankedValue>> {
        let directors = to_string_series(require_series(df, &self.config.columns.director)?)?;
        Ok(most_frequent(directors.str()?.into_iter().flatten()))
    }
}
