//! Feature derivation over the cleaned table.
//!
//! The extractor adds columns and never relaxes the cleaned-table
//! invariants: every column the cleaner guaranteed keeps its type and
//! non-null property. Rows are only removed for malformed runtime text and
//! only under [`RuntimePolicy::DropRow`].

mod encoders;
pub mod text;

use crate::cleaner::coerce_to_f64;
use crate::config::{PipelineConfig, RuntimePolicy};
use crate::error::{ProcessingError, Result};
use crate::types::{ActionType, CleaningSummary, ProcessingAction};
use crate::utils::{require_series, to_string_series};
use encoders::one_hot_drop_first;
use polars::prelude::*;
use text::{count_genres, decade_of, normalize_genre, runtime_minutes};
use tracing::{debug, info, warn};

/// Adds the derived columns to a cleaned table.
pub struct FeatureExtractor<'a> {
    config: &'a PipelineConfig,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Derive every feature column.
    ///
    /// Column order of the result: the cleaned columns (genre replaced by
    /// its normalized form, rating as Float64), then runtime minutes,
    /// decade, genre count and the certificate flags.
    pub fn derive(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        let df = self.add_runtime_minutes(df, summary)?;
        let df = self.coerce_rating(df, summary)?;
        let df = self.add_decade(df, summary)?;
        let df = self.normalize_genres(df, summary)?;
        let df = self.encode_certificates(df, summary)?;

        info!(
            "Derived {} columns: {}",
            summary.derived_columns.len(),
            summary.derived_columns.join(", ")
        );
        Ok(df)
    }

    /// Parse runtime text into integer minutes.
    ///
    /// A row whose runtime has no digits (or is missing) is malformed. With
    /// [`RuntimePolicy::Fail`] the first such row aborts the run; with
    /// [`RuntimePolicy::DropRow`] every such row is dropped and counted.
    pub fn add_runtime_minutes(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let mut df = df;
        let source = self.config.columns.runtime.as_str();
        let target = self.config.columns.runtime_minutes.as_str();

        let texts = to_string_series(require_series(&df, source)?)?;
        let texts = texts.str()?;
        let minutes: Vec<Option<i64>> = texts
            .into_iter()
            .map(|text| text.and_then(runtime_minutes))
            .collect();

        let malformed = minutes.iter().filter(|m| m.is_none()).count();
        if malformed > 0 {
            match self.config.runtime_policy {
                RuntimePolicy::Fail => {
                    let row = minutes.iter().position(Option::is_none).unwrap_or_default();
                    let value = texts.get(row).map(String::from);
                    warn!(
                        "Runtime at row {} has no digits: {:?}; aborting",
                        row, value
                    );
                    return Err(ProcessingError::MalformedRuntime { row, value });
                }
                RuntimePolicy::DropRow => {
                    let keep: Vec<bool> = minutes.iter().map(Option::is_some).collect();
                    let mask = BooleanChunked::from_slice("mask".into(), &keep);
                    df = df.filter(&mask)?;

                    warn!("Dropped {} rows with malformed '{}'", malformed, source);
                    summary.runtime_rows_dropped += malformed;
                    summary.add_action(ProcessingAction::new(
                        ActionType::MalformedRowsDropped,
                        source,
                        format!("Dropped {} rows whose runtime has no digits", malformed),
                    ));
                }
            }
        }

        let minutes: Vec<i64> = minutes.into_iter().flatten().collect();
        df.with_column(Series::new(target.into(), minutes))?;
        record_derived(summary, target, format!("Minutes parsed from '{}'", source));
        Ok(df)
    }

    /// Coerce rating to Float64; unparseable ratings become missing.
    pub fn coerce_rating(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        let mut df = df;
        let name = self.config.columns.rating.as_str();

        let (rating, missing) = coerce_to_f64(require_series(&df, name)?, &[])?;
        if missing > 0 {
            warn!("{} '{}' values are missing or unparseable", missing, name);
            summary.add_warning(format!(
                "{} '{}' values are missing or unparseable",
                missing, name
            ));
        }
        df.with_column(rating)?;
        Ok(df)
    }

    /// Bucket the release year into decades.
    pub fn add_decade(&self, df: DataFrame, summary: &mut CleaningSummary) -> Result<DataFrame> {
        let mut df = df;
        let source = self.config.columns.release_year.as_str();
        let target = self.config.columns.decade.as_str();

        let years = require_series(&df, source)?.cast(&DataType::Int64)?;
        let decades: Vec<Option<i64>> = years.i64()?.into_iter().map(|y| y.map(decade_of)).collect();

        df.with_column(Series::new(target.into(), decades))?;
        record_derived(summary, target, format!("'{}' floored to its decade", source));
        Ok(df)
    }

    /// Count genre entries and replace genre with its canonical form.
    pub fn normalize_genres(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let mut df = df;
        let name = self.config.columns.genre.as_str();
        let count_name = self.config.columns.num_genres.as_str();

        let genres = to_string_series(require_series(&df, name)?)?;
        let genres = genres.str()?;
        let counts: Vec<Option<i64>> = genres
            .into_iter()
            .map(|g| g.map(|g| count_genres(g) as i64))
            .collect();
        let normalized: Vec<Option<String>> =
            genres.into_iter().map(|g| g.map(normalize_genre)).collect();

        df.replace(name, Series::new(name.into(), normalized))?;
        df.with_column(Series::new(count_name.into(), counts))?;

        record_derived(summary, count_name, format!("Entries in '{}'", name));
        debug!("Normalized '{}' to sorted entries", name);
        Ok(df)
    }

    /// One-hot encode certificates, dropping the smallest level.
    pub fn encode_certificates(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<DataFrame> {
        let mut df = df;
        let name = self.config.columns.certificate.as_str();
        let columns = &self.config.columns;

        let (reference, flags) =
            one_hot_drop_first(require_series(&df, name)?, |level| columns.certificate_flag(level))?;
        if let Some(reference) = &reference {
            debug!("'{}' reference level: {}", name, reference);
        }

        for flag in flags {
            let flag_name = flag.name().to_string();
            df.with_column(flag)?;
            record_derived(
                summary,
                &flag_name,
                format!(
                    "Flag for '{}'; reference level {}",
                    name,
                    reference.as_deref().unwrap_or("none")
                ),
            );
        }
        Ok(df)
    }
}

fn record_derived(summary: &mut CleaningSummary, column: &str, details: String) {
    summary.derived_columns.push(column.to_string());
    summary.add_action(
        ProcessingAction::new(
            ActionType::ColumnDerived,
            column,
            format!("Added column '{}'", column),
        )
        .with_details(details),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaned_frame() -> DataFrame {
        df!(
            "Series_Title" => &["Heat", "Alien", "Up"],
            "Released_Year" => &[1995i64, 1979, 2009],
            "Certificate" => &["R", "A", "U"],
            "Runtime" => &["170 min", "117 min", "96 min"],
            "Genre" => &["Drama, Crime", "Horror, Sci-Fi", "Animation, Adventure, Comedy"],
            "Director" => &["Michael Mann", "Ridley Scott", "Pete Docter"],
            "IMDB_Rating" => &["8.3", "8.4", "8.2"],
            "Gross" => &[67436818.0, 78900000.0, 293004164.0]
        )
        .unwrap()
    }

    #[test]
    fn test_derive_adds_columns() {
        let config = PipelineConfig::default();
        let extractor = FeatureExtractor::new(&config);
        let mut summary = CleaningSummary::new();

        let df = extractor.derive(cleaned_frame(), &mut summary).unwrap();

        let minutes: Vec<Option<i64>> =
            df.column("Runtime_Minutes").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(minutes, vec![Some(170), Some(117), Some(96)]);

        let decades: Vec<Option<i64>> =
            df.column("Decade").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(decades, vec![Some(1990), Some(1970), Some(2000)]);

        let genre = df.column("Genre").unwrap();
        assert_eq!(genre.str().unwrap().get(0), Some("Crime, Drama"));
        assert_eq!(
            genre.str().unwrap().get(2),
            Some("Adventure, Animation, Comedy")
        );

        let counts: Vec<Option<i64>> =
            df.column("Num_Genres").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(counts, vec![Some(2), Some(2), Some(3)]);

        assert_eq!(df.column("IMDB_Rating").unwrap().dtype(), &DataType::Float64);

        assert!(df.column("Certificate_A").is_err());
        assert!(df.column("Certificate_R").is_ok());
        assert!(df.column("Certificate_U").is_ok());
        assert!(df.column("Certificate").is_ok());

        assert_eq!(
            summary.derived_columns,
            vec![
                "Runtime_Minutes",
                "Decade",
                "Num_Genres",
                "Certificate_R",
                "Certificate_U"
            ]
        );
    }

    #[test]
    fn test_malformed_runtime_fails_by_default() {
        let config = PipelineConfig::default();
        let extractor = FeatureExtractor::new(&config);
        let mut summary = CleaningSummary::new();
        let df = df!(
            "Runtime" => &[Some("120 min"), Some("unknown"), None]
        )
        .unwrap();

        let err = extractor.add_runtime_minutes(df, &mut summary).unwrap_err();
        match err {
            ProcessingError::MalformedRuntime { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value.as_deref(), Some("unknown"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_runtime_drop_policy() {
        let config = PipelineConfig::builder()
            .runtime_policy(RuntimePolicy::DropRow)
            .build()
            .unwrap();
        let extractor = FeatureExtractor::new(&config);
        let mut summary = CleaningSummary::new();
        let df = df!(
            "Series_Title" => &["A", "B", "C"],
            "Runtime" => &[Some("120 min"), Some("unknown"), None]
        )
        .unwrap();

        let df = extractor.add_runtime_minutes(df, &mut summary).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(
            df.column("Series_Title").unwrap().str().unwrap().get(0),
            Some("A")
        );
        assert_eq!(summary.runtime_rows_dropped, 2);
    }

    #[test]
    fn test_derive_missing_runtime_column() {
        let config = PipelineConfig::default();
        let extractor = FeatureExtractor::new(&config);
        let mut summary = CleaningSummary::new();
        let df = cleaned_frame().drop("Runtime").unwrap();

        let err = extractor.derive(df, &mut summary).unwrap_err();
        assert!(matches!(err, ProcessingError::MissingColumn(name) if name == "Runtime"));
    }

    #[test]
    fn test_derive_empty_table() {
        let config = PipelineConfig::default();
        let extractor = FeatureExtractor::new(&config);
        let mut summary = CleaningSummary::new();
        let df = cleaned_frame().head(Some(0));

        let df = extractor.derive(df, &mut summary).unwrap();

        assert_eq!(df.height(), 0);
        assert!(df.column("Runtime_Minutes").is_ok());
        assert!(df.column("Decade").is_ok());
    }
}
