//! Main movie pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! running the clean → derive → insights sequence.

use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::features::FeatureExtractor;
use crate::insights::{AnalysisTables, InsightExtractor};
use crate::pipeline::outliers::{GrossOutlierFilter, OutlierSummary};
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{CleaningSummary, Insights, PipelineOutput};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

// Share of input rows whose removal triggers a data-loss warning
const ROW_LOSS_WARNING_PCT: f32 = 30.0;

/// The movie pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use reelscope_processing::{Pipeline, PipelineConfig, RuntimePolicy};
///
/// let output = Pipeline::builder()
///     .config(
///         PipelineConfig::builder()
///             .runtime_policy(RuntimePolicy::DropRow)
///             .build()?,
///     )
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(raw)?;
///
/// println!("{:?}", output.insights.most_common_genre);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Pipeline can be moved to a worker thread
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean a raw table.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::MissingColumn`](crate::ProcessingError::MissingColumn)
    /// when a required column is absent. Parse failures are never errors;
    /// they are counted in the returned summary.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningSummary)> {
        let start_time = Instant::now();
        let mut summary = CleaningSummary::new();
        summary.rows_before = df.height();

        let df = self.clean_into(df, &mut summary)?;
        self.finish_summary(&mut summary, df.height(), start_time);
        Ok((df, summary))
    }

    /// Derive feature columns and insights from a cleaned table.
    pub fn derive(&self, df: DataFrame) -> Result<(DataFrame, Insights)> {
        let mut summary = CleaningSummary::new();
        let df = self.derive_into(df, &mut summary)?;
        let insights = self.insights_for(&df)?;
        Ok((df, insights))
    }

    /// Run the full sequence: clean, derive, compute insights.
    ///
    /// The observer receives a final `Complete` or `Failed` update.
    pub fn process(&self, df: DataFrame) -> Result<PipelineOutput> {
        match self.process_internal(df) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Pipeline completed: {} rows",
                    output.data.height()
                )));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Summary tables for an enriched table.
    pub fn analyze(&self, df: &DataFrame) -> Result<AnalysisTables> {
        AnalysisTables::compute(df, &self.config)
    }

    /// Gross outlier view of an enriched table. The table is not modified.
    pub fn outlier_view(&self, df: &DataFrame) -> Result<(DataFrame, Option<OutlierSummary>)> {
        GrossOutlierFilter::new(&self.config).apply(df)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineOutput> {
        let start_time = Instant::now();

        info!("Starting movie pipeline on {} rows...", df.height());
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Initializing,
            0.0,
            "Starting movie pipeline...",
        ));

        let mut summary = CleaningSummary::new();
        summary.rows_before = df.height();

        let df = self.clean_into(df, &mut summary)?;
        let df = self.derive_into(df, &mut summary)?;
        let insights = self.insights_for(&df)?;

        self.finish_summary(&mut summary, df.height(), start_time);
        info!(
            "Pipeline complete in {}ms: {} → {} rows",
            summary.duration_ms, summary.rows_before, summary.rows_after
        );

        Ok(PipelineOutput {
            data: df,
            insights,
            summary,
        })
    }

    fn clean_into(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        let mut previous_rows = df.height();
        DataCleaner::new(&self.config).clean_with(df, summary, |stage, df| {
            let removed = previous_rows.saturating_sub(df.height());
            previous_rows = df.height();
            self.report_progress(ProgressUpdate::finished(
                stage,
                df.height(),
                removed,
                format!("{} done: {} rows", stage.display_name(), df.height()),
            ));
        })
        .map_err(|e| e.in_stage(ProcessingError::CleaningFailed))
    }

    fn derive_into(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        let rows = df.height();
        let df = FeatureExtractor::new(&self.config)
            .derive(df, summary)
            .map_err(|e| e.in_stage(ProcessingError::FeatureExtractionFailed))?;
        self.report_progress(ProgressUpdate::finished(
            PipelineStage::FeatureExtraction,
            df.height(),
            rows - df.height(),
            format!("Derived {} columns", summary.derived_columns.len()),
        ));
        Ok(df)
    }

    fn insights_for(&self, df: &DataFrame) -> Result<Insights> {
        let insights = InsightExtractor::new(&self.config).compute(df)?;
        self.report_progress(ProgressUpdate::finished(
            PipelineStage::InsightExtraction,
            df.height(),
            0,
            format!("Computed insights ({} unavailable)", insights.unavailable().len()),
        ));
        Ok(insights)
    }

    fn finish_summary(&self, summary: &mut CleaningSummary, rows_after: usize, start: Instant) {
        summary.rows_after = rows_after;
        summary.rows_removed = summary.rows_before.saturating_sub(rows_after);
        summary.duration_ms = start.elapsed().as_millis() as u64;

        let pct = summary.rows_removed_percentage();
        if pct > ROW_LOSS_WARNING_PCT {
            warn!("{:.1}% of input rows were removed", pct);
            summary.add_warning(format!(
                "{:.1}% of input rows were removed ({} of {})",
                pct, summary.rows_removed, summary.rows_before
            ));
        }
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// PipelineBuilder can be moved to another thread during construction
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use reelscope_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StageLogger;
    ///
    /// impl ProgressReporter for StageLogger {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StageLogger))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
