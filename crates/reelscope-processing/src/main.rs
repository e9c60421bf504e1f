//! CLI entry point for the movie catalog pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use reelscope_processing::{
    AnalysisReport, Pipeline, PipelineConfig, ReportGenerator, RuntimePolicy,
};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Movie catalog cleaning and insight pipeline",
    long_about = "Cleans a movie catalog CSV, derives analysis features and reports insights.\n\n\
                  EXAMPLES:\n  \
                  # Default dataset and output directory\n  \
                  reelscope-processing\n\n  \
                  # Custom input and output\n  \
                  reelscope-processing --csv data/movies.csv --out results/\n\n  \
                  # Drop rows with unparseable runtimes instead of failing\n  \
                  reelscope-processing --drop-malformed-runtime\n\n  \
                  # Machine-readable output\n  \
                  reelscope-processing --json | jq .insights"
)]
struct Args {
    /// Path to the movie catalog CSV
    ///
    /// If the file does not exist you are prompted for another path
    #[arg(long, default_value = "data/imdb_top_1000.csv")]
    csv: PathBuf,

    /// Output directory for the cleaned dataset and report
    #[arg(short, long, default_value = "output")]
    out: PathBuf,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "cleaned_movies"
    #[arg(long)]
    output_name: Option<String>,

    /// JSON file with pipeline configuration overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Drop rows whose runtime has no digits instead of failing the run
    #[arg(long)]
    drop_malformed_runtime: bool,

    /// Do not write the JSON report file
    #[arg(long)]
    no_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout
/// only carries the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables (e.g. RUST_LOG) before the filter reads them
    dotenv().ok();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let pipeline = Pipeline::builder().config(config).build()?;

    let csv_path = resolve_csv_path(&args.csv)?;

    if !args.out.exists() {
        std::fs::create_dir_all(&args.out)
            .with_context(|| format!("Failed to create {}", args.out.display()))?;
        info!("Created output directory: {}", args.out.display());
    }

    info!("Loading dataset from: {}", csv_path.display());
    let data = load_csv_with_fallbacks(&csv_path)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    run_pipeline(&pipeline, &args, &csv_path, data)
}

/// Merge the optional config file with CLI overrides.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config = PipelineConfig::from_json_file(path)?;
            debug!("Loaded configuration from {}", path.display());
            config
        }
        None => PipelineConfig::default(),
    };

    config.output_dir = args.out.clone();
    if let Some(name) = &args.output_name {
        config.output_name = Some(name.clone());
    }
    if args.drop_malformed_runtime {
        config.runtime_policy = RuntimePolicy::DropRow;
    }
    if args.no_report {
        config.generate_reports = false;
    }

    config.validate()?;
    Ok(config)
}

/// Return `path` if it is a file, otherwise prompt on stdin until the user
/// names one. End of input or an empty answer aborts.
fn resolve_csv_path(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    warn!("CSV file not found: {}", path.display());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("Enter the path to the movie CSV: ");
        io::stderr().flush().ok();

        let Some(line) = lines.next() else {
            return Err(anyhow!("No CSV file provided"));
        };
        let answer = line?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(anyhow!("No CSV file provided"));
        }

        let candidate = PathBuf::from(answer);
        if candidate.is_file() {
            return Ok(candidate);
        }
        eprintln!("File not found: {}", candidate.display());
    }
}

/// Run the pipeline, write outputs and print results.
fn run_pipeline(pipeline: &Pipeline, args: &Args, csv_path: &Path, data: DataFrame) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting movie pipeline...");
    info!("{}", "=".repeat(80));

    let original_shape = data.shape();
    let mut output = match pipeline.process(data) {
        Ok(output) => output,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": &e }))?);
            }
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    let analysis = pipeline.analyze(&output.data)?;
    let (_, gross_outliers) = pipeline.outlier_view(&output.data)?;

    let config = pipeline.config();
    let generator = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());
    let dataset_path = generator.write_dataset(&mut output.data)?;
    let dataset_path = dataset_path.to_string_lossy().to_string();

    let report = ReportGenerator::build_report(
        &csv_path.to_string_lossy(),
        Some(&dataset_path),
        &output,
        &analysis,
        gross_outliers.as_ref(),
    );

    if config.generate_reports {
        let report_path = generator.write_report(&report, generator.dataset_name())?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, original_shape);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the CLI's primary output and must be
/// visible regardless of the log level.
fn print_human_readable_summary(report: &AnalysisReport, original_shape: (usize, usize)) {
    let summary = &report.processing_summary;
    let insights = &report.insights;

    println!();
    println!("{}", "=".repeat(80));
    println!("PROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, original_shape.0, original_shape.1
    );
    if let Some(ref output_file) = report.output_file {
        println!(
            "Output: {} ({} rows x {} columns)",
            output_file,
            report.dataset.rows,
            report.dataset.columns.len()
        );
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed,
        summary.rows_removed_percentage()
    );
    println!("  Certificates filled: {}", summary.certificates_filled);
    match summary.gross_fill_value {
        Some(value) => println!(
            "  Gross imputed: {} (fill value {:.2})",
            summary.gross_imputed, value
        ),
        None => println!("  Gross imputed: none"),
    }
    println!(
        "  Dropped: {} incomplete, {} bad year, {} duplicate titles, {} bad runtime",
        summary.critical_rows_dropped,
        summary.year_rows_dropped,
        summary.duplicates_removed,
        summary.runtime_rows_dropped
    );
    println!("  Derived columns: {}", summary.derived_columns.join(", "));
    println!();

    println!("Insights:");
    match &insights.top_grossing {
        Some(top) => println!("  Top grossing: {} ({:.0})", top.title, top.gross),
        None => println!("  Top grossing: unavailable"),
    }
    match &insights.most_common_genre {
        Some(genre) => println!("  Most common genre: {} ({})", genre.value, genre.count),
        None => println!("  Most common genre: unavailable"),
    }
    match &insights.most_common_director {
        Some(director) => println!(
            "  Most common director: {} ({})",
            director.value, director.count
        ),
        None => println!("  Most common director: unavailable"),
    }
    println!();

    if !report.analysis.rating_by_decade.is_empty() {
        println!("Average Rating by Decade:");
        for row in &report.analysis.rating_by_decade {
            println!(
                "  {}s: {:.2} ({} titles)",
                row.decade, row.mean_rating, row.titles
            );
        }
        println!();
    }

    if let Some(outliers) = &report.gross_outliers {
        println!(
            "Gross Outliers: {} removed from the analysis view (bounds {:.0} .. {:.0})",
            outliers.rows_removed, outliers.lower, outliers.upper
        );
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
}

/// Load a CSV with every column read as text, falling back to a lenient
/// parse when the strict one fails.
///
/// Reading everything as text keeps malformed numeric cells (e.g. a
/// certificate in the year column) for the cleaner to handle.
fn load_csv_with_fallbacks(path: &Path) -> Result<DataFrame> {
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_ignore_errors(true)
        .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("Could not parse {}", path.display()))
}
