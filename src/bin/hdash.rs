//! hdash CLI - Command-line interface for healthdash
//!
//! Commands:
//! - dashboard: Build every dashboard series from a health snapshot
//! - weekday: Average samples by weekday
//! - diffs: Average day-over-day changes by weekday
//! - sleep: Score nights from staged sleep intervals
//! - add: Validate a user-entered value and record it in a snapshot

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use healthdash::aggregate::{average_by_weekday, daily_differentials};
use healthdash::sleep::{night_breakdowns, score_nights};
use healthdash::{
    parse_metric_value, Calendar, ComputeError, DashboardConfig, DashboardProcessor,
    HealthMetricKind, HealthSnapshot, HealthStore, HealthStoreError, Sample, SleepInterval,
    SnapshotStore, HEALTHDASH_VERSION,
};

/// hdash - Derived metrics for a personal health dashboard
#[derive(Parser)]
#[command(name = "hdash")]
#[command(version = HEALTHDASH_VERSION)]
#[command(about = "Turn raw health samples into dashboard series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every dashboard series from a health snapshot
    Dashboard {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Dashboard configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Local offset east of UTC in minutes (overrides the config file)
        #[arg(long, allow_hyphen_values = true)]
        utc_offset_minutes: Option<i32>,

        /// Reference time in RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Average samples by weekday
    Weekday {
        #[command(flatten)]
        args: SeriesArgs,
    },

    /// Average day-over-day changes of date-ordered samples by weekday
    Diffs {
        #[command(flatten)]
        args: SeriesArgs,
    },

    /// Score nights from staged sleep intervals
    Sleep {
        #[command(flatten)]
        args: SeriesArgs,

        /// Emit per-night stage hours and component scores
        #[arg(long)]
        breakdown: bool,
    },

    /// Validate a user-entered value and record it in a snapshot
    Add {
        /// Snapshot file to update
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Metric to record
        #[arg(long, value_enum)]
        metric: AddMetric,

        /// Value as typed by the user
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Sample time in RFC 3339 (defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Where to write the updated snapshot (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct SeriesArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Output format
    #[arg(long, default_value = "json")]
    output_format: OutputFormat,

    /// Local offset east of UTC in minutes
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    utc_offset_minutes: i32,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum AddMetric {
    Steps,
    Weight,
    ActiveEnergy,
}

impl From<AddMetric> for HealthMetricKind {
    fn from(metric: AddMetric) -> Self {
        match metric {
            AddMetric::Steps => HealthMetricKind::Steps,
            AddMetric::Weight => HealthMetricKind::Weight,
            AddMetric::ActiveEnergy => HealthMetricKind::ActiveEnergy,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Log filter from `HDASH_LOG`, falling back to `RUST_LOG`, default `warn`
fn init_logging() {
    let log_env = std::env::var("HDASH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

fn run(cli: Cli) -> Result<(), HdashCliError> {
    match cli.command {
        Commands::Dashboard {
            input,
            output,
            output_format,
            config,
            utc_offset_minutes,
            now,
        } => cmd_dashboard(
            &input,
            &output,
            output_format,
            config.as_deref(),
            utc_offset_minutes,
            now.as_deref(),
        ),

        Commands::Weekday { args } => {
            let calendar = Calendar::with_offset_minutes(args.utc_offset_minutes)?;
            let samples: Vec<Sample> = read_records(&args.input, &args.input_format)?;
            write_records(&args.output, &args.output_format, &average_by_weekday(&calendar, &samples))
        }

        Commands::Diffs { args } => {
            let calendar = Calendar::with_offset_minutes(args.utc_offset_minutes)?;
            let samples: Vec<Sample> = read_records(&args.input, &args.input_format)?;
            write_records(&args.output, &args.output_format, &daily_differentials(&calendar, &samples))
        }

        Commands::Sleep { args, breakdown } => {
            let calendar = Calendar::with_offset_minutes(args.utc_offset_minutes)?;
            let intervals: Vec<SleepInterval> = read_records(&args.input, &args.input_format)?;
            if breakdown {
                write_records(&args.output, &args.output_format, &night_breakdowns(&calendar, &intervals))
            } else {
                write_records(&args.output, &args.output_format, &score_nights(&calendar, &intervals))
            }
        }

        Commands::Add {
            snapshot,
            metric,
            value,
            date,
            output,
        } => cmd_add(&snapshot, metric.into(), &value, date.as_deref(), output.as_deref()),
    }
}

fn cmd_dashboard(
    input: &Path,
    output: &Path,
    output_format: OutputFormat,
    config_path: Option<&Path>,
    utc_offset_minutes: Option<i32>,
    now: Option<&str>,
) -> Result<(), HdashCliError> {
    let mut config = match config_path {
        Some(path) => DashboardConfig::from_json(&fs::read_to_string(path)?)?,
        None => DashboardConfig::default(),
    };
    if let Some(minutes) = utc_offset_minutes {
        config.utc_offset_minutes = minutes;
    }

    let now = parse_time(now)?;
    let snapshot = HealthSnapshot::from_json(&read_input(input)?)?;
    let store = SnapshotStore::new(snapshot);
    let processor = DashboardProcessor::new(config)?;
    let dashboard = processor.build(&store, now)?;

    let data = match output_format {
        OutputFormat::Json | OutputFormat::Ndjson => serde_json::to_string(&dashboard)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&dashboard)? + "\n",
    };
    write_output(output, &data)
}

fn cmd_add(
    snapshot_path: &Path,
    kind: HealthMetricKind,
    raw_value: &str,
    date: Option<&str>,
    output: Option<&Path>,
) -> Result<(), HdashCliError> {
    let value = parse_metric_value(kind, raw_value)?;
    let date = parse_time(date)?;

    let snapshot = HealthSnapshot::from_json(&fs::read_to_string(snapshot_path)?)?;
    let mut store = SnapshotStore::new(snapshot);
    store.save_sample(kind, Sample::new(date, value))?;
    tracing::info!(metric = kind.as_str(), value, "recorded sample");

    let data = store.into_snapshot().to_json()?;
    write_output(output.unwrap_or(snapshot_path), &(data + "\n"))
}

fn parse_time(raw: Option<&str>) -> Result<DateTime<Utc>, HdashCliError> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| HdashCliError::ParseError(format!("Invalid timestamp '{}': {}", raw, e))),
        None => Ok(Utc::now()),
    }
}

fn read_input(input: &Path) -> Result<String, HdashCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            tracing::warn!("reading from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records<T: DeserializeOwned>(input: &Path, format: &InputFormat) -> Result<Vec<T>, HdashCliError> {
    let data = read_input(input)?;
    parse_records(&data, format)
}

fn parse_records<T: DeserializeOwned>(data: &str, format: &InputFormat) -> Result<Vec<T>, HdashCliError> {
    match format {
        InputFormat::Json => Ok(serde_json::from_str(data)?),
        InputFormat::Ndjson => {
            let mut records = Vec::new();
            for (line_num, line) in data.lines().enumerate() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let record = serde_json::from_str(trimmed).map_err(|e| {
                    HdashCliError::ParseError(format!("Line {}: {}", line_num + 1, e))
                })?;
                records.push(record);
            }
            Ok(records)
        }
    }
}

fn format_records<T: Serialize>(records: &[T], format: &OutputFormat) -> Result<String, HdashCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + if lines.is_empty() { "" } else { "\n" })
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

fn write_records<T: Serialize>(output: &Path, format: &OutputFormat, records: &[T]) -> Result<(), HdashCliError> {
    tracing::debug!(records = records.len(), "writing series");
    write_output(output, &format_records(records, format)?)
}

fn write_output(output: &Path, data: &str) -> Result<(), HdashCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error handling

#[derive(Debug)]
enum HdashCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    Store(HealthStoreError),
    ParseError(String),
}

impl From<io::Error> for HdashCliError {
    fn from(e: io::Error) -> Self {
        HdashCliError::Io(e)
    }
}

impl From<ComputeError> for HdashCliError {
    fn from(e: ComputeError) -> Self {
        match e {
            ComputeError::Store(e) => HdashCliError::Store(e),
            other => HdashCliError::Compute(other),
        }
    }
}

impl From<serde_json::Error> for HdashCliError {
    fn from(e: serde_json::Error) -> Self {
        HdashCliError::Json(e)
    }
}

impl From<HealthStoreError> for HdashCliError {
    fn from(e: HealthStoreError) -> Self {
        HdashCliError::Store(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HdashCliError> for CliError {
    fn from(e: HdashCliError) -> Self {
        match e {
            HdashCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HdashCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the configuration and --utc-offset-minutes".to_string()),
            },
            HdashCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax and --input-format".to_string()),
            },
            HdashCliError::Store(e) => CliError {
                code: e.code().to_string(),
                message: e.to_string(),
                hint: Some(e.failure_reason()),
            },
            HdashCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}
