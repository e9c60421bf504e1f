//! Progress reporting for the movie pipeline.
//!
//! The pipeline announces each stage it finishes to an optional observer.
//! Observers never influence the result; a run with no reporter produces
//! exactly the same table as a run with one.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelscope_processing::Pipeline;
//!
//! let output = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the movie pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Pipeline is starting
    Initializing,
    /// Required columns checked, missing markers normalized
    Validation,
    /// Missing certificates replaced with the sentinel
    CertificateRepair,
    /// Gross parsed to numbers and imputed
    GrossParsing,
    /// Rows missing a critical field dropped
    CriticalFieldFilter,
    /// Release year parsed, failures dropped
    ReleaseYearParsing,
    /// Repeated titles removed
    Deduplication,
    /// Derived columns added
    FeatureExtraction,
    /// Aggregate lookups computed
    InsightExtraction,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Validation => "Validating Input",
            Self::CertificateRepair => "Repairing Certificates",
            Self::GrossParsing => "Parsing Gross",
            Self::CriticalFieldFilter => "Dropping Incomplete Rows",
            Self::ReleaseYearParsing => "Parsing Release Years",
            Self::Deduplication => "Removing Duplicate Titles",
            Self::FeatureExtraction => "Deriving Features",
            Self::InsightExtraction => "Computing Insights",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the non-terminal stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::Validation => 0.08,
            Self::CertificateRepair => 0.05,
            Self::GrossParsing => 0.10,
            Self::CriticalFieldFilter => 0.05,
            Self::ReleaseYearParsing => 0.10,
            Self::Deduplication => 0.10,
            Self::FeatureExtraction => 0.30,
            Self::InsightExtraction => 0.20,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::Validation => 0.02,
            Self::CertificateRepair => 0.10,
            Self::GrossParsing => 0.15,
            Self::CriticalFieldFilter => 0.25,
            Self::ReleaseYearParsing => 0.30,
            Self::Deduplication => 0.40,
            Self::FeatureExtraction => 0.50,
            Self::InsightExtraction => 0.80,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    /// Rows in the table after the stage ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,

    /// Rows the stage removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            rows: None,
            affected_rows: None,
        }
    }

    /// Creates an update for a finished stage with its row counts.
    pub fn finished(
        stage: PipelineStage,
        rows: usize,
        affected_rows: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rows: Some(rows),
            affected_rows: Some(affected_rows),
            ..Self::new(stage, 1.0, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
            rows: None,
            affected_rows: None,
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
            rows: None,
            affected_rows: None,
        }
    }
}

/// Trait for receiving progress updates.
///
/// Implementations must be `Send + Sync` so a pipeline carrying one can be
/// moved to a worker thread.
pub trait ProgressReporter: Send + Sync {
    /// Called once per finished stage. Implementations should not block.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
