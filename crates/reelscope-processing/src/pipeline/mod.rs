//! Pipeline module.
//!
//! This module provides the movie pipeline and its observer types.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use outliers::{GrossOutlierFilter, OutlierSummary};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
