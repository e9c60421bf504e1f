//! Movie Catalog Processing Library
//!
//! Cleaning, feature derivation and insight extraction for tabular movie
//! catalogs, built on Polars.
//!
//! # Overview
//!
//! - **Cleaning**: certificate repair, gross parsing and imputation,
//!   critical-field filtering, release-year parsing, title de-duplication
//! - **Features**: runtime minutes, decade, canonical genre lists, genre
//!   counts and certificate flags
//! - **Insights**: top-grossing title, most common genre and director
//! - **Analysis**: rating by decade, ranked counts, descriptive statistics,
//!   correlations and a gross outlier view
//! - **Progress Reporting**: an optional observer notified after every stage
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use reelscope_processing::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let raw = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .with_infer_schema_length(Some(0))
//!     .try_into_reader_with_file_path(Some("data/imdb_top_1000.csv".into()))?
//!     .finish()?;
//!
//! let output = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(raw)?;
//!
//! println!("Top grossing: {:?}", output.insights.top_grossing);
//! println!("Most common genre: {:?}", output.insights.most_common_genre);
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to rename columns or change per-field policies:
//!
//! ```rust,ignore
//! use reelscope_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .certificate_fill("Unrated")
//!     .gross_imputation(GrossImputation::Mean)
//!     .runtime_policy(RuntimePolicy::DropRow)
//!     .require_release_year(false)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod insights;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::DataCleaner;
pub use config::{
    ColumnNames, ConfigValidationError, GrossImputation, PipelineConfig, PipelineConfigBuilder,
    RuntimePolicy,
};
pub use error::{ProcessingError, Result as ProcessingResult};
pub use features::FeatureExtractor;
pub use insights::{
    AnalysisTables, ColumnStats, CorrelationMatrix, DecadeRating, InsightExtractor,
};
pub use pipeline::{
    ClosureProgressReporter, GrossOutlierFilter, OutlierSummary, Pipeline, PipelineBuilder,
    PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use reporting::{AnalysisReport, DatasetShape, ReportGenerator};
pub use types::{
    ActionType, CleaningSummary, Insights, PipelineOutput, ProcessingAction, RankedValue,
    TopGrossing,
};
