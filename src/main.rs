//! CLI entry point for the grade analytics engine.
//!
//! Provides subcommands computing averages, per-subject report cards,
//! average histories and chart points from an exported grade collection.

mod infra;

use crate::infra::config::AnalyticsConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use grade_analytics::{
    AverageStrategy, Grade, NO_AVERAGE, ScoreField, amplify_for_display, build_average_history,
    compute_strategy_average, compute_subject_average,
    output::{append_record, print_json, print_pretty, write_json},
    parser::load_grades,
    summarize,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_analytics")]
#[command(about = "Averages, progressions and chart points from school grade exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the overall average of a grade collection
    Average {
        /// JSON or CSV grade export (optionally .gz)
        #[arg(short, long)]
        input: PathBuf,

        /// subject-mean, weighted-pool or median
        #[arg(short, long)]
        strategy: Option<AverageStrategy>,

        /// student, average, min or max
        #[arg(short, long)]
        field: Option<ScoreField>,
    },
    /// Compute the average of a single subject
    Subject {
        #[arg(short, long)]
        input: PathBuf,

        /// Subject identifier to reduce over
        #[arg(long)]
        subject: String,

        #[arg(short, long)]
        field: Option<ScoreField>,
    },
    /// Build the chronological progression of an average
    History {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        strategy: Option<AverageStrategy>,

        #[arg(short, long)]
        field: Option<ScoreField>,

        /// CSV file to append the progression to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build chart points from the progression of an average
    Chart {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        strategy: Option<AverageStrategy>,

        #[arg(short, long)]
        field: Option<ScoreField>,

        /// Maximum of the chart's value axis
        #[arg(long)]
        scale: Option<f64>,

        /// JSON file to write the chart points to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Per-subject report card
    Summary {
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file to write the summary to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging();

    let cli = Cli::parse();
    let config = AnalyticsConfig::from_env()?;
    print_pretty(&config);

    match cli.command {
        Commands::Average {
            input,
            strategy,
            field,
        } => {
            let strategy = strategy.unwrap_or(config.strategy);
            let field = field.unwrap_or(config.field);
            average(&input, strategy, field)?;
        }
        Commands::Subject {
            input,
            subject,
            field,
        } => {
            subject_average(&input, &subject, field.unwrap_or(config.field))?;
        }
        Commands::History {
            input,
            strategy,
            field,
            output,
        } => {
            let strategy = strategy.unwrap_or(config.strategy);
            let field = field.unwrap_or(config.field);
            history(&input, strategy, field, output.as_deref())?;
        }
        Commands::Chart {
            input,
            strategy,
            field,
            scale,
            output,
        } => {
            let strategy = strategy.unwrap_or(config.strategy);
            let field = field.unwrap_or(config.field);
            let scale = scale.unwrap_or(config.scale);
            chart(&input, strategy, field, scale, output.as_deref())?;
        }
        Commands::Summary { input, output } => {
            summary(&input, output.as_deref())?;
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_logging() -> WorkerGuard {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/grade_analytics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_analytics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

fn describe(average: f64) -> String {
    if average == NO_AVERAGE {
        "no average".to_string()
    } else {
        format!("{average:.2}")
    }
}

#[tracing::instrument(skip_all, fields(input = %input.display(), %strategy, %field))]
fn average(input: &Path, strategy: AverageStrategy, field: ScoreField) -> Result<()> {
    let grades = load_grades(input)?;
    let average = compute_strategy_average(&grades, strategy, field);

    info!(grades = grades.len(), average, "Average computed");
    println!("{strategy} average ({field}) over {} grades: {average:.2}", grades.len());
    Ok(())
}

#[tracing::instrument(skip_all, fields(input = %input.display(), subject = subject, %field))]
fn subject_average(input: &Path, subject: &str, field: ScoreField) -> Result<()> {
    let grades = load_grades(input)?;
    let selected: Vec<&Grade> = grades.iter().filter(|g| g.subject_id == subject).collect();

    if selected.is_empty() {
        warn!("No grades recorded for this subject");
    }

    let average = compute_subject_average(&selected, field);
    info!(grades = selected.len(), average, "Subject average computed");
    println!("{subject} ({field}): {}", describe(average));
    Ok(())
}

#[tracing::instrument(skip_all, fields(input = %input.display(), %strategy, %field))]
fn history(
    input: &Path,
    strategy: AverageStrategy,
    field: ScoreField,
    output: Option<&Path>,
) -> Result<()> {
    let grades = load_grades(input)?;
    let history = build_average_history(&grades, strategy, field);

    match output {
        Some(path) => {
            append_record(path, &history)?;
            info!(points = history.len(), path = %path.display(), "History appended");
        }
        None => {
            for point in &history {
                println!("{}  {:.2}", point.date.format("%Y-%m-%d"), point.average);
            }
        }
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(input = %input.display(), %strategy, %field, scale = scale))]
fn chart(
    input: &Path,
    strategy: AverageStrategy,
    field: ScoreField,
    scale: f64,
    output: Option<&Path>,
) -> Result<()> {
    let grades = load_grades(input)?;
    let history = build_average_history(&grades, strategy, field);
    let points = amplify_for_display(&history, scale);

    if points.len() < history.len() {
        warn!(
            dropped = history.len() - points.len(),
            "Non-finite averages left out of the chart"
        );
    }

    match output {
        Some(path) => {
            write_json(path, &points)?;
            info!(points = points.len(), path = %path.display(), "Chart points written");
        }
        None => print_json(&points)?,
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(input = %input.display()))]
fn summary(input: &Path, output: Option<&Path>) -> Result<()> {
    let grades = load_grades(input)?;
    let summary = summarize(&grades);

    if let Some(path) = output {
        write_json(path, &summary)?;
        info!(subjects = summary.subjects.len(), path = %path.display(), "Summary written");
        return Ok(());
    }

    for subject in &summary.subjects {
        let shown = |value: Option<f64>| describe(value.unwrap_or(NO_AVERAGE));
        println!(
            "- {} ({}): student {}, class {}, min {}, max {} across {} grades",
            subject.subject_name,
            subject.subject_id,
            shown(subject.student),
            shown(subject.class_average),
            shown(subject.class_min),
            shown(subject.class_max),
            subject.grade_count
        );
    }
    for entry in &summary.overall {
        println!("{}: {:.2}", entry.strategy, entry.average);
    }
    Ok(())
}
