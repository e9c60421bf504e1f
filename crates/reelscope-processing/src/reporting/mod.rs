//! Report generation module.
//!
//! Writes the enriched table as CSV and the run report as JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelscope_processing::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"), None);
//! let dataset_path = generator.write_dataset(&mut output.data)?;
//!
//! let report = ReportGenerator::build_report(
//!     "data/imdb_top_1000.csv",
//!     Some(&dataset_path.to_string_lossy()),
//!     &output,
//!     &analysis,
//!     outliers.as_ref(),
//! );
//! generator.write_report(&report, "cleaned_movies")?;
//! ```

mod generator;

pub use generator::{AnalysisReport, DatasetShape, ReportGenerator};
