//! Error types for the movie cleaning pipeline.
//!
//! Only two conditions escalate to the caller: a required input column that
//! is absent, and (under the default runtime policy) a runtime cell with no
//! digits. Parse failures in release year and gross are resolved inside the
//! pipeline and surface as counts in the summary instead.
//!
//! Errors serialize as `{code, message}`; the CLI prints that form when a
//! `--json` run fails.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// A required column was not found in the input table.
    #[error("Required column '{0}' not found in dataset")]
    MissingColumn(String),

    /// A runtime cell contained no decimal digits.
    #[error("Malformed runtime at row {row}: {value:?} contains no digits")]
    MalformedRuntime { row: usize, value: Option<String> },

    /// Data cleaning failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// Feature derivation failed.
    #[error("Failed to derive features: {0}")]
    FeatureExtractionFailed(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl ProcessingError {
    /// Stable machine-readable code for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumn(_) => "MISSING_COLUMN",
            Self::MalformedRuntime { .. } => "MALFORMED_RUNTIME",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::FeatureExtractionFailed(_) => "FEATURE_EXTRACTION_FAILED",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }

    /// Rewrap a Polars failure as a stage-level failure, leaving typed
    /// errors untouched.
    pub fn in_stage(self, wrap: fn(String) -> ProcessingError) -> Self {
        match self {
            Self::Polars(e) => wrap(e.to_string()),
            other => other,
        }
    }
}

impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::MissingColumn("Genre".to_string()).error_code(),
            "MISSING_COLUMN"
        );
        assert_eq!(
            ProcessingError::MalformedRuntime {
                row: 3,
                value: Some("n/a".to_string())
            }
            .error_code(),
            "MALFORMED_RUNTIME"
        );
    }

    #[test]
    fn test_in_stage_wraps_polars_only() {
        let polars = ProcessingError::Polars(polars::error::PolarsError::NoData("empty".into()));
        let wrapped = polars.in_stage(ProcessingError::CleaningFailed);
        assert_eq!(wrapped.error_code(), "CLEANING_FAILED");

        let typed = ProcessingError::MissingColumn("Genre".to_string())
            .in_stage(ProcessingError::CleaningFailed);
        assert_eq!(typed.error_code(), "MISSING_COLUMN");
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::MissingColumn("Director".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("MISSING_COLUMN"));
        assert!(json.contains("Director"));
    }

    #[test]
    fn test_malformed_runtime_message() {
        let error = ProcessingError::MalformedRuntime {
            row: 7,
            value: Some("unknown".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains("row 7"));
        assert!(message.contains("unknown"));
    }
}
