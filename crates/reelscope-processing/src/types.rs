use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

// ============================================================================
// Insights
// ============================================================================

/// The highest-grossing entry of the cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopGrossing {
    pub title: String,
    pub gross: f64,
}

/// A value together with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedValue {
    pub value: String,
    pub count: usize,
}

impl RankedValue {
    pub fn new(value: impl Into<String>, count: usize) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Aggregate lookups over the enriched table.
///
/// Every lookup is `None` when the column it reads has no eligible values
/// after cleaning; serialized, an unavailable lookup is an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub top_grossing: Option<TopGrossing>,
    pub most_common_genre: Option<RankedValue>,
    pub most_common_director: Option<RankedValue>,
}

impl Insights {
    /// Whether every lookup produced a value.
    pub fn is_complete(&self) -> bool {
        self.top_grossing.is_some()
            && self.most_common_genre.is_some()
            && self.most_common_director.is_some()
    }

    /// Names of the lookups that could not be computed.
    pub fn unavailable(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.top_grossing.is_none() {
            missing.push("top_grossing");
        }
        if self.most_common_genre.is_none() {
            missing.push("most_common_genre");
        }
        if self.most_common_director.is_none() {
            missing.push("most_common_director");
        }
        missing
    }
}

// ============================================================================
// Cleaning Summary
// ============================================================================

/// Types of actions the pipeline can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Missing text values were marked as missing
    MarkersNormalized,
    /// Missing certificates were replaced with the sentinel
    SentinelFilled,
    /// Unparseable gross values were imputed
    ValueImputed,
    /// Rows missing a critical field were dropped
    RowsDropped,
    /// Rows with an unparseable release year were dropped
    ParseFailureDropped,
    /// Rows repeating an earlier title were dropped
    DuplicatesRemoved,
    /// A derived column was added
    ColumnDerived,
    /// Rows with malformed runtime text were dropped
    MalformedRowsDropped,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MarkersNormalized => "Markers Normalized",
            Self::SentinelFilled => "Sentinel Filled",
            Self::ValueImputed => "Value Imputed",
            Self::RowsDropped => "Rows Dropped",
            Self::ParseFailureDropped => "Parse Failure Dropped",
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::ColumnDerived => "Column Derived",
            Self::MalformedRowsDropped => "Malformed Rows Dropped",
        };
        write!(f, "{}", name)
    }
}

/// A single action performed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingAction {
    pub action_type: ActionType,
    /// Column the action applies to, or "dataset".
    pub target: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProcessingAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Counts and observations collected while cleaning and deriving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,

    /// Text cells recognized as missing markers.
    pub markers_normalized: usize,
    /// Certificates replaced with the sentinel.
    pub certificates_filled: usize,
    /// Gross cells that were missing or unparseable before imputation.
    pub gross_missing: usize,
    /// Gross cells actually filled.
    pub gross_imputed: usize,
    /// Value used to fill gross, if one was defined.
    pub gross_fill_value: Option<f64>,
    /// Rows dropped for a missing critical field.
    pub critical_rows_dropped: usize,
    /// Rows dropped because the release year did not parse.
    pub year_rows_dropped: usize,
    /// Rows dropped as repeated titles.
    pub duplicates_removed: usize,
    /// Rows dropped for runtime text without digits.
    pub runtime_rows_dropped: usize,

    /// Derived columns added by the extractor, in insertion order.
    pub derived_columns: Vec<String>,

    pub actions: Vec<ProcessingAction>,
    pub warnings: Vec<String>,
}

impl CleaningSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: ProcessingAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }
}

// ============================================================================
// Pipeline Output
// ============================================================================

/// Everything a full pipeline run hands to the rendering layer.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Cleaned table with derived columns.
    pub data: DataFrame,
    pub insights: Insights,
    pub summary: CleaningSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insights_default_is_unavailable() {
        let insights = Insights::default();
        assert!(!insights.is_complete());
        assert_eq!(
            insights.unavailable(),
            vec!["top_grossing", "most_common_genre", "most_common_director"]
        );
    }

    #[test]
    fn test_insights_serialize_absent_as_null() {
        let json = serde_json::to_value(Insights::default()).unwrap();
        assert!(json["top_grossing"].is_null());
        assert!(json["most_common_genre"].is_null());
        assert!(json["most_common_director"].is_null());
    }

    #[test]
    fn test_rows_removed_percentage() {
        let mut summary = CleaningSummary::new();
        assert_eq!(summary.rows_removed_percentage(), 0.0);

        summary.rows_before = 200;
        summary.rows_removed = 50;
        assert_eq!(summary.rows_removed_percentage(), 25.0);
    }

    #[test]
    fn test_action_serialization() {
        let action = ProcessingAction::new(ActionType::SentinelFilled, "Certificate", "Filled 3")
            .with_details("sentinel: Not Rated");
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"action_type\":\"sentinel_filled\""));
        assert!(json.contains("sentinel: Not Rated"));
        assert_eq!(ActionType::DuplicatesRemoved.to_string(), "Duplicates Removed");
    }
}
