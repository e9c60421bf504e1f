//! Integration tests for the movie pipeline.
//!
//! These tests verify end-to-end behavior of the pipeline using small
//! catalog fixtures shaped like the IMDb Top 1000 export.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use reelscope_processing::{
    Insights, Pipeline, PipelineConfig, PipelineOutput, PipelineStage, ProcessingError,
    ProgressUpdate, RankedValue, ReportGenerator, RuntimePolicy, TopGrossing,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Load a fixture with every column read as text, as the CLI does.
fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn run_default(df: DataFrame) -> PipelineOutput {
    Pipeline::builder()
        .build()
        .unwrap()
        .process(df)
        .expect("Pipeline should complete successfully")
}

fn strings(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect()
}

fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_sample_catalog() {
    let output = run_default(load_csv("sample_movies.csv"));
    let df = &output.data;

    assert_eq!(
        strings(df, "Series_Title"),
        vec![
            "The Shawshank Redemption",
            "The Godfather",
            "The Dark Knight",
            "12 Angry Men",
            "Inception",
            "Il buono, il brutto, il cattivo",
            "Interstellar",
            "Hamilton",
        ]
    );

    let summary = &output.summary;
    assert_eq!(summary.rows_before, 11);
    assert_eq!(summary.rows_after, 8);
    assert_eq!(summary.critical_rows_dropped, 1);
    assert_eq!(summary.year_rows_dropped, 1);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.certificates_filled, 1);
    assert_eq!(summary.gross_missing, 2);
    assert_eq!(summary.gross_fill_value, Some(134_966_411.0));
}

#[test]
fn test_end_to_end_field_parsing() {
    let output = run_default(load_csv("sample_movies.csv"));
    let df = &output.data;

    assert_eq!(ints(df, "Runtime_Minutes")[0], Some(142));
    assert_eq!(ints(df, "Released_Year")[0], Some(1994));
    assert_eq!(ints(df, "Decade")[0], Some(1990));
    assert_eq!(
        ints(df, "Decade"),
        vec![
            Some(1990),
            Some(1970),
            Some(2000),
            Some(1950),
            Some(2010),
            Some(1960),
            Some(2010),
            Some(2020),
        ]
    );

    let gross = df.column("Gross").unwrap().f64().unwrap();
    assert_eq!(gross.get(0), Some(28_341_469.0));
    // imputed with the median of parseable values
    assert_eq!(gross.get(6), Some(134_966_411.0));
    assert_eq!(gross.get(7), Some(134_966_411.0));

    let rating = df.column("IMDB_Rating").unwrap().f64().unwrap();
    assert_eq!(rating.get(0), Some(9.3));

    assert_eq!(strings(df, "Certificate")[4], "Not Rated");
    assert_eq!(strings(df, "Genre")[2], "Action, Crime, Drama");
    assert_eq!(ints(df, "Num_Genres")[2], Some(3));
}

#[test]
fn test_cleaned_invariants_hold() {
    let output = run_default(load_csv("sample_movies.csv"));
    let df = &output.data;

    for name in ["Certificate", "Genre", "Director", "Series_Title", "Released_Year"] {
        assert_eq!(
            df.column(name).unwrap().null_count(),
            0,
            "{} should have no nulls",
            name
        );
    }

    let titles = strings(df, "Series_Title");
    let unique: HashSet<&String> = titles.iter().collect();
    assert_eq!(unique.len(), titles.len(), "titles should be unique");

    assert_eq!(df.column("Released_Year").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("Gross").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_certificate_flags() {
    let output = run_default(load_csv("sample_movies.csv"));
    let df = &output.data;

    // "A" is the smallest level and acts as the reference
    assert!(df.column("Certificate_A").is_err());
    for flag in [
        "Certificate_Not Rated",
        "Certificate_PG-13",
        "Certificate_U",
        "Certificate_UA",
    ] {
        assert_eq!(
            df.column(flag).unwrap().dtype(),
            &DataType::Boolean,
            "{} should be a flag column",
            flag
        );
    }

    let ua: Vec<Option<bool>> = df
        .column("Certificate_UA")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        ua,
        vec![
            Some(false),
            Some(false),
            Some(true),
            Some(false),
            Some(false),
            Some(false),
            Some(true),
            Some(false),
        ]
    );
}

#[test]
fn test_insights_sample_catalog() {
    let output = run_default(load_csv("sample_movies.csv"));

    assert_eq!(
        output.insights,
        Insights {
            top_grossing: Some(TopGrossing {
                title: "The Dark Knight".to_string(),
                gross: 534_858_444.0,
            }),
            most_common_genre: Some(RankedValue::new("Drama", 6)),
            most_common_director: Some(RankedValue::new("Christopher Nolan", 3)),
        }
    );
}

// ============================================================================
// Edge Case Tests
// ============================================================================

#[test]
fn test_missing_required_column_is_fatal() {
    let df = load_csv("sample_movies.csv").drop("Director").unwrap();

    let result = Pipeline::builder().build().unwrap().process(df);

    match result {
        Err(ProcessingError::MissingColumn(name)) => assert_eq!(name, "Director"),
        other => panic!("expected MissingColumn, got {:?}", other.map(|o| o.data.shape())),
    }
}

#[test]
fn test_optional_columns_may_be_absent() {
    let output = run_default(load_csv("no_optional_columns.csv"));
    let df = &output.data;

    assert_eq!(df.height(), 3);
    assert_eq!(
        strings(df, "Certificate"),
        vec!["Not Rated", "Not Rated", "Not Rated"]
    );
    assert_eq!(df.column("Gross").unwrap().null_count(), 3);
    assert_eq!(output.summary.gross_fill_value, None);

    assert!(output.insights.top_grossing.is_none());
    assert_eq!(
        output.insights.most_common_genre,
        Some(RankedValue::new("Romance", 2))
    );
    assert_eq!(
        output.insights.most_common_director,
        Some(RankedValue::new("Director A", 2))
    );
    assert!(!output.summary.warnings.is_empty());
}

#[test]
fn test_malformed_runtime_fails_run() {
    let df = load_csv("bad_runtime.csv");

    let result = Pipeline::builder().build().unwrap().process(df);

    match result {
        Err(ProcessingError::MalformedRuntime { row, value }) => {
            assert_eq!(row, 1);
            assert_eq!(value.as_deref(), Some("unknown"));
        }
        other => panic!("expected MalformedRuntime, got {:?}", other.map(|o| o.data.shape())),
    }
}

#[test]
fn test_malformed_runtime_drop_mode() {
    let df = load_csv("bad_runtime.csv");
    let config = PipelineConfig::builder()
        .runtime_policy(RuntimePolicy::DropRow)
        .build()
        .unwrap();

    let output = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    assert_eq!(strings(&output.data, "Series_Title"), vec!["Alpha", "Gamma"]);
    assert_eq!(ints(&output.data, "Runtime_Minutes"), vec![Some(101), Some(88)]);
    assert_eq!(output.summary.runtime_rows_dropped, 1);
}

#[test]
fn test_empty_table_reports_unavailable_insights() {
    let df = load_csv("sample_movies.csv").head(Some(0));

    let output = run_default(df);

    assert_eq!(output.data.height(), 0);
    assert_eq!(output.insights, Insights::default());
    assert_eq!(
        output.insights.unavailable(),
        vec!["top_grossing", "most_common_genre", "most_common_director"]
    );
}

#[test]
fn test_genre_tie_break_follows_input_order() {
    let df = df!(
        "Series_Title" => &["One", "Two"],
        "Released_Year" => &["1990", "1991"],
        "Certificate" => &["U", "U"],
        "Runtime" => &["90 min", "95 min"],
        "Genre" => &["Drama, Comedy", "Comedy, Drama"],
        "IMDB_Rating" => &["7.0", "7.5"],
        "Director" => &["X", "Y"],
        "Gross" => &["1", "2"]
    )
    .unwrap();

    let output = run_default(df);

    assert_eq!(
        strings(&output.data, "Genre"),
        vec!["Comedy, Drama", "Comedy, Drama"]
    );
    assert_eq!(
        output.insights.most_common_genre,
        Some(RankedValue::new("Comedy", 2))
    );
    assert_eq!(
        output.insights.most_common_director,
        Some(RankedValue::new("X", 1))
    );
}

#[test]
fn test_lenient_year_variant() {
    let df = df!(
        "Series_Title" => &["One", "Two"],
        "Released_Year" => &[None, Some("1991")],
        "Certificate" => &["U", "U"],
        "Runtime" => &["90 min", "95 min"],
        "Genre" => &["Drama", "Comedy"],
        "IMDB_Rating" => &["7.0", "7.5"],
        "Director" => &["X", "Y"],
        "Gross" => &["1", "2"]
    )
    .unwrap();
    let config = PipelineConfig::builder()
        .require_release_year(false)
        .build()
        .unwrap();

    let output = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    // the year-parse step still removes the row
    assert_eq!(strings(&output.data, "Series_Title"), vec!["Two"]);
    assert_eq!(output.summary.critical_rows_dropped, 0);
    assert_eq!(output.summary.year_rows_dropped, 1);
}

// ============================================================================
// Progress Reporting Tests
// ============================================================================

#[test]
fn test_progress_updates_are_monotonic() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    Pipeline::builder()
        .on_progress(move |update| updates_clone.lock().unwrap().push(update))
        .build()
        .unwrap()
        .process(load_csv("sample_movies.csv"))
        .unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.first().map(|u| u.stage), Some(PipelineStage::Initializing));
    assert_eq!(updates.last().map(|u| u.stage), Some(PipelineStage::Complete));

    for pair in updates.windows(2) {
        assert!(
            pair[1].progress >= pair[0].progress,
            "progress went backwards: {:?} -> {:?}",
            pair[0].stage,
            pair[1].stage
        );
    }

    let dedup = updates
        .iter()
        .find(|u| u.stage == PipelineStage::Deduplication)
        .unwrap();
    assert_eq!(dedup.rows, Some(8));
    assert_eq!(dedup.affected_rows, Some(1));
}

// ============================================================================
// Analysis & Reporting Tests
// ============================================================================

#[test]
fn test_analysis_tables_and_outlier_view() {
    let pipeline = Pipeline::builder().build().unwrap();
    let output = pipeline.process(load_csv("sample_movies.csv")).unwrap();

    let tables = pipeline.analyze(&output.data).unwrap();
    let decades: Vec<i64> = tables.rating_by_decade.iter().map(|r| r.decade).collect();
    assert_eq!(decades, vec![1950, 1960, 1970, 1990, 2000, 2010, 2020]);
    assert_eq!(tables.top_directors[0], RankedValue::new("Christopher Nolan", 3));
    assert_eq!(tables.top_genres[0], RankedValue::new("Drama", 6));
    assert!(tables.describe.iter().any(|s| s.column == "Runtime_Minutes" && s.count == 8));

    let view_correlation = tables.outlier_view_correlation.as_ref().unwrap();
    assert_eq!(
        view_correlation.columns,
        vec!["IMDB_Rating", "Runtime_Minutes", "Log_Gross", "Released_Year"]
    );
    assert!(view_correlation.get("Log_Gross", "Log_Gross").is_some());

    let (view, outliers) = pipeline.outlier_view(&output.data).unwrap();
    let outliers = outliers.unwrap();
    assert_eq!(outliers.rows_kept + outliers.rows_removed, output.data.height());
    assert_eq!(view.height(), outliers.rows_kept);
    assert!(view.column("Log_Gross").is_ok());
    assert!(output.data.column("Log_Gross").is_err());
}

#[test]
fn test_report_files_written() {
    let dir = std::env::temp_dir().join(format!("reelscope-it-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let pipeline = Pipeline::builder().build().unwrap();
    let mut output = pipeline.process(load_csv("sample_movies.csv")).unwrap();
    let tables = pipeline.analyze(&output.data).unwrap();
    let (_, outliers) = pipeline.outlier_view(&output.data).unwrap();

    let generator = ReportGenerator::new(dir.clone(), None);
    let dataset_path = generator.write_dataset(&mut output.data).unwrap();
    let report = ReportGenerator::build_report(
        "sample_movies.csv",
        Some(&dataset_path.to_string_lossy()),
        &output,
        &tables,
        outliers.as_ref(),
    );
    let report_path = generator.write_report(&report, generator.dataset_name()).unwrap();

    assert_eq!(dataset_path, dir.join("cleaned_movies.csv"));
    assert_eq!(report_path, dir.join("cleaned_movies_report.json"));

    let reloaded = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(dataset_path))
        .unwrap()
        .finish()
        .unwrap();
    assert_eq!(reloaded.height(), 8);

    std::fs::remove_dir_all(&dir).ok();
}
