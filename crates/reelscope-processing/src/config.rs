//! Configuration types for the movie cleaning pipeline.
//!
//! Each field carries its own repair policy: certificates get a sentinel,
//! gross is imputed column-wide, release year drops the row. The defaults
//! reproduce that split exactly; the builder exists so callers can tune a
//! single policy without touching the others.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Strategy for filling gross values that could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GrossImputation {
    /// Use the median of the parseable values
    #[default]
    Median,
    /// Use the mean of the parseable values
    Mean,
    /// Use a constant value (0.0)
    Zero,
    /// Leave unparseable values missing
    Keep,
}

/// What to do with a runtime cell that has no digits in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RuntimePolicy {
    /// Abort the whole run with `ProcessingError::MalformedRuntime`
    #[default]
    Fail,
    /// Drop the offending rows before deriving features
    DropRow,
}

/// Names of the input and derived columns.
///
/// Defaults match the IMDb Top 1000 CSV layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub title: String,
    pub release_year: String,
    pub certificate: String,
    pub runtime: String,
    pub genre: String,
    pub director: String,
    pub rating: String,
    pub gross: String,

    pub runtime_minutes: String,
    pub decade: String,
    pub num_genres: String,
    pub log_gross: String,
    /// Prefix for the one-hot certificate flag columns.
    pub certificate_flag_prefix: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            title: "Series_Title".to_string(),
            release_year: "Released_Year".to_string(),
            certificate: "Certificate".to_string(),
            runtime: "Runtime".to_string(),
            genre: "Genre".to_string(),
            director: "Director".to_string(),
            rating: "IMDB_Rating".to_string(),
            gross: "Gross".to_string(),
            runtime_minutes: "Runtime_Minutes".to_string(),
            decade: "Decade".to_string(),
            num_genres: "Num_Genres".to_string(),
            log_gross: "Log_Gross".to_string(),
            certificate_flag_prefix: "Certificate_".to_string(),
        }
    }
}

impl ColumnNames {
    /// Columns whose absence is a fatal precondition violation.
    pub fn required(&self) -> [&str; 6] {
        [
            self.title.as_str(),
            self.release_year.as_str(),
            self.runtime.as_str(),
            self.genre.as_str(),
            self.director.as_str(),
            self.rating.as_str(),
        ]
    }

    /// Columns that may legitimately be absent from the input.
    pub fn optional(&self) -> [&str; 2] {
        [self.certificate.as_str(), self.gross.as_str()]
    }

    /// Every input column name, required first.
    pub fn inputs(&self) -> Vec<&str> {
        let mut names = self.required().to_vec();
        names.extend(self.optional());
        names
    }

    /// Name of the flag column for a certificate value.
    pub fn certificate_flag(&self, value: &str) -> String {
        format!("{}{}", self.certificate_flag_prefix, value)
    }
}

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use reelscope_processing::config::{PipelineConfig, RuntimePolicy};
///
/// let config = PipelineConfig::builder()
///     .runtime_policy(RuntimePolicy::DropRow)
///     .certificate_fill("Unrated")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input and derived column names.
    pub columns: ColumnNames,

    /// Sentinel written into missing certificate cells.
    /// Default: "Not Rated"
    pub certificate_fill: String,

    /// Strategy for filling unparseable gross values.
    /// Default: Median
    pub gross_imputation: GrossImputation,

    /// Characters stripped from textual gross values before parsing.
    /// Default: [',']
    pub thousands_separators: Vec<char>,

    /// Whether a missing release year is part of the critical-field drop.
    /// When false, missing years are still dropped by the year parsing step.
    /// Default: true
    pub require_release_year: bool,

    /// Whether to drop rows repeating an earlier title.
    /// Default: true
    pub deduplicate_titles: bool,

    /// Policy for runtime cells without digits.
    /// Default: Fail
    pub runtime_policy: RuntimePolicy,

    /// Whether conventional CSV missing markers ("NA", "NaN", "null", ...)
    /// in text columns are treated as missing.
    /// Default: true
    pub normalize_missing_markers: bool,

    /// IQR multiplier for the gross outlier view.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Length of the ranked genre/director lists in the report.
    /// Default: 10
    pub top_n: usize,

    /// Output directory for the cleaned dataset and report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Custom output file name (without extension).
    /// If None, uses "cleaned_movies".
    pub output_name: Option<String>,

    /// Whether to write the JSON analysis report.
    /// Default: true
    pub generate_reports: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            certificate_fill: "Not Rated".to_string(),
            gross_imputation: GrossImputation::default(),
            thousands_separators: vec![','],
            require_release_year: true,
            deduplicate_titles: true,
            runtime_policy: RuntimePolicy::default(),
            normalize_missing_markers: true,
            iqr_multiplier: 1.5,
            top_n: 10,
            output_dir: PathBuf::from("output"),
            output_name: None,
            generate_reports: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigValidationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigValidationError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: PipelineConfig =
            serde_json::from_str(&content).map_err(|e| ConfigValidationError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let inputs = self.columns.inputs();
        if let Some(empty) = inputs.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyColumnName(empty.to_string()));
        }

        let mut seen = HashSet::new();
        for name in &inputs {
            if !seen.insert(*name) {
                return Err(ConfigValidationError::DuplicateColumnName(name.to_string()));
            }
        }

        if self.certificate_fill.trim().is_empty() {
            return Err(ConfigValidationError::EmptySentinel);
        }

        if let Some(c) = self
            .thousands_separators
            .iter()
            .find(|c| c.is_ascii_digit() || matches!(**c, '.' | '-' | '+'))
        {
            return Err(ConfigValidationError::InvalidSeparator(*c));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column name for '{0}' must not be empty")]
    EmptyColumnName(String),

    #[error("Column '{0}' is mapped to more than one input field")]
    DuplicateColumnName(String),

    #[error("Certificate sentinel must not be empty")]
    EmptySentinel,

    #[error("Invalid thousands separator {0:?} (digits, '.', '-' and '+' are reserved)")]
    InvalidSeparator(char),

    #[error("Invalid IQR multiplier: {0} (must be a positive finite number)")]
    InvalidIqrMultiplier(f64),

    #[error("Invalid top-N length: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Could not read configuration from '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    columns: Option<ColumnNames>,
    certificate_fill: Option<String>,
    gross_imputation: Option<GrossImputation>,
    thousands_separators: Option<Vec<char>>,
    require_release_year: Option<bool>,
    deduplicate_titles: Option<bool>,
    runtime_policy: Option<RuntimePolicy>,
    normalize_missing_markers: Option<bool>,
    iqr_multiplier: Option<f64>,
    top_n: Option<usize>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    generate_reports: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the input and derived column names.
    pub fn columns(mut self, columns: ColumnNames) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Set the sentinel written into missing certificate cells.
    pub fn certificate_fill(mut self, sentinel: impl Into<String>) -> Self {
        self.certificate_fill = Some(sentinel.into());
        self
    }

    /// Set the gross imputation strategy.
    pub fn gross_imputation(mut self, strategy: GrossImputation) -> Self {
        self.gross_imputation = Some(strategy);
        self
    }

    /// Set the characters stripped from gross text before parsing.
    pub fn thousands_separators(mut self, separators: impl Into<Vec<char>>) -> Self {
        self.thousands_separators = Some(separators.into());
        self
    }

    /// Include or exclude release year from the critical-field drop.
    pub fn require_release_year(mut self, require: bool) -> Self {
        self.require_release_year = Some(require);
        self
    }

    /// Enable or disable title de-duplication.
    pub fn deduplicate_titles(mut self, dedupe: bool) -> Self {
        self.deduplicate_titles = Some(dedupe);
        self
    }

    /// Set the policy for runtime cells without digits.
    pub fn runtime_policy(mut self, policy: RuntimePolicy) -> Self {
        self.runtime_policy = Some(policy);
        self
    }

    /// Enable or disable missing-marker normalization.
    pub fn normalize_missing_markers(mut self, normalize: bool) -> Self {
        self.normalize_missing_markers = Some(normalize);
        self
    }

    /// Set the IQR multiplier for the gross outlier view.
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the length of ranked lists in the report.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the output directory for the dataset and report.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable report generation.
    pub fn generate_reports(mut self, generate: bool) -> Self {
        self.generate_reports = Some(generate);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            columns: self.columns.unwrap_or(defaults.columns),
            certificate_fill: self.certificate_fill.unwrap_or(defaults.certificate_fill),
            gross_imputation: self.gross_imputation.unwrap_or_default(),
            thousands_separators: self
                .thousands_separators
                .unwrap_or(defaults.thousands_separators),
            require_release_year: self.require_release_year.unwrap_or(true),
            deduplicate_titles: self.deduplicate_titles.unwrap_or(true),
            runtime_policy: self.runtime_policy.unwrap_or_default(),
            normalize_missing_markers: self.normalize_missing_markers.unwrap_or(true),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            generate_reports: self.generate_reports.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
