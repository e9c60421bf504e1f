use crate::insights::AnalysisTables;
use crate::pipeline::OutlierSummary;
use crate::types::{CleaningSummary, Insights, PipelineOutput};
use anyhow::{Context, Result};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const DEFAULT_DATASET_NAME: &str = "cleaned_movies";

// ============================================================================
// Analysis Report Types
// ============================================================================

/// Everything one pipeline run produced, in a single serializable record.
///
/// Use this for both JSON output (`--json`) and the report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the written dataset (if written)
    pub output_file: Option<String>,

    /// Shape and columns of the enriched table
    pub dataset: DatasetShape,

    /// Counts and actions collected while cleaning and deriving
    pub processing_summary: CleaningSummary,

    pub insights: Insights,
    pub analysis: AnalysisTables,

    /// Bounds of the gross outlier view, if gross had values
    pub gross_outliers: Option<OutlierSummary>,
}

/// Shape of the enriched table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub columns: Vec<String>,
}

impl DatasetShape {
    fn of(df: &DataFrame) -> Self {
        Self {
            rows: df.height(),
            columns: df
                .get_column_names()
                .into_iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// File stem of the written dataset.
    pub fn dataset_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_DATASET_NAME)
    }

    /// Write the enriched table as `<name>.csv` in the output directory.
    pub fn write_dataset(&self, df: &mut DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let output_path = self.output_dir.join(format!("{}.csv", self.dataset_name()));
        let mut file = File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)?;

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Build the report for one pipeline run.
    pub fn build_report(
        input_file: &str,
        output_file: Option<&str>,
        output: &PipelineOutput,
        analysis: &AnalysisTables,
        gross_outliers: Option<&OutlierSummary>,
    ) -> AnalysisReport {
        AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            dataset: DatasetShape::of(&output.data),
            processing_summary: output.summary.clone(),
            insights: output.insights.clone(),
            analysis: analysis.clone(),
            gross_outliers: gross_outliers.cloned(),
        }
    }

    /// Write a report to `<report_base_name>_report.json` in the output
    /// directory.
    pub fn write_report(&self, report: &AnalysisReport, report_base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
