//! trends CLI - Command-line interface for headache-trends
//!
//! Commands:
//! - stats: Aggregate rows into a dashboard payload
//! - context: Render the assistant context block
//! - extract: Show what the field extractor resolves for each row
//! - entry: Validate a new entry and print its sheet row

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use headache_trends::entry::{NewEntry, SHEET_COLUMNS};
use headache_trends::pipeline::{parse_reference_time, TrendsProcessor};
use headache_trends::types::RawRecord;
use headache_trends::{RowFormat, View, TRENDS_VERSION};

/// trends - Headache log statistics from spreadsheet rows
#[derive(Parser)]
#[command(name = "trends")]
#[command(version = TRENDS_VERSION)]
#[command(about = "Aggregate headache log rows into dashboard statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate rows into a dashboard payload
    Stats {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input payload shape
        #[arg(long, default_value = "rows")]
        format: InputFormat,

        /// Aggregation view (weekly or monthly; anything else is weekly)
        #[arg(long, default_value = "weekly")]
        view: String,

        /// Reference time (YYYY-MM-DDTHH:MM:SS); defaults to the local clock
        #[arg(long)]
        now: Option<String>,

        /// Producer instance ID; defaults to a random UUID
        #[arg(long)]
        instance_id: Option<String>,

        /// Pretty-print the payload
        #[arg(long)]
        pretty: bool,
    },

    /// Render the assistant context block
    Context {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input payload shape
        #[arg(long, default_value = "rows")]
        format: InputFormat,
    },

    /// Show resolved date, pain level and medication for each row (NDJSON)
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input payload shape
        #[arg(long, default_value = "rows")]
        format: InputFormat,
    },

    /// Validate a new entry and print the sheet row it appends
    Entry {
        /// Entry date (YYYY-MM-DD is rewritten to MM/DD/YYYY)
        #[arg(long)]
        date: String,

        /// Pain level, 0-10
        #[arg(long)]
        pain_level: String,

        /// Start time (24-hour HH:MM is rewritten to hh:MM AM/PM)
        #[arg(long, default_value = "")]
        start_time: String,

        #[arg(long, default_value = "")]
        pain_location: String,

        #[arg(long, default_value = "")]
        triggers: String,

        #[arg(long, default_value = "")]
        medication: String,

        #[arg(long, default_value = "")]
        medication_count: String,

        #[arg(long, default_value = "Yes")]
        headache: String,

        #[arg(long, default_value = "")]
        notes: String,

        /// Timestamp for the entry (YYYY-MM-DDTHH:MM:SS); defaults to the local clock
        #[arg(long)]
        now: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON array of row objects
    Rows,
    /// Spreadsheet value grid, header row first
    Grid,
}

impl From<InputFormat> for RowFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Rows => RowFormat::Rows,
            InputFormat::Grid => RowFormat::Grid,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TrendsCliError> {
    match cli.command {
        Commands::Stats {
            input,
            output,
            format,
            view,
            now,
            instance_id,
            pretty,
        } => cmd_stats(
            &input,
            &output,
            format.into(),
            &view,
            now.as_deref(),
            instance_id,
            pretty,
        ),

        Commands::Context {
            input,
            output,
            format,
        } => cmd_context(&input, &output, format.into()),

        Commands::Extract {
            input,
            output,
            format,
        } => cmd_extract(&input, &output, format.into()),

        Commands::Entry {
            date,
            pain_level,
            start_time,
            pain_location,
            triggers,
            medication,
            medication_count,
            headache,
            notes,
            now,
        } => {
            let entry = NewEntry {
                date,
                start_time,
                pain_level,
                pain_location,
                triggers,
                medication,
                medication_count,
                headache,
                notes,
            };
            cmd_entry(&entry, now.as_deref())
        }
    }
}

fn cmd_stats(
    input: &Path,
    output: &Path,
    format: RowFormat,
    view: &str,
    now: Option<&str>,
    instance_id: Option<String>,
    pretty: bool,
) -> Result<(), TrendsCliError> {
    let now = parse_reference_time(now)?;
    let input_data = read_input(input)?;

    let processor = match instance_id {
        Some(id) => TrendsProcessor::with_instance_id(id),
        None => TrendsProcessor::new(),
    };

    let payload = processor.payload(format, &input_data, View::from_selector(view), now)?;
    log::debug!(
        "{} view: {} records in window",
        payload.view.as_str(),
        payload.stats.total_headaches()
    );

    let pretty = pretty || (is_stdout(output) && atty::is(atty::Stream::Stdout));
    let mut output_data = if pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    output_data.push('\n');

    write_output(output, &output_data)
}

fn cmd_context(input: &Path, output: &Path, format: RowFormat) -> Result<(), TrendsCliError> {
    let input_data = read_input(input)?;
    let text = TrendsProcessor::new().context(format, &input_data)?;
    write_output(output, &text)
}

fn cmd_extract(input: &Path, output: &Path, format: RowFormat) -> Result<(), TrendsCliError> {
    let input_data = read_input(input)?;
    let rows = TrendsProcessor::new().extract(format, &input_data)?;

    let mut output_data = String::new();
    for row in &rows {
        output_data.push_str(&serde_json::to_string(row)?);
        output_data.push('\n');
    }

    write_output(output, &output_data)
}

fn cmd_entry(entry: &NewEntry, now: Option<&str>) -> Result<(), TrendsCliError> {
    entry.validate()?;
    let now = parse_reference_time(now)?;

    let record: RawRecord = SHEET_COLUMNS.into_iter().zip(entry.to_row(now)).collect();
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

fn is_stdout(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(input: &Path) -> Result<String, TrendsCliError> {
    if is_stdout(input) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), TrendsCliError> {
    if is_stdout(output) {
        let mut stdout = io::stdout();
        stdout.write_all(data.as_bytes())?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum TrendsCliError {
    Io(io::Error),
    Compute(headache_trends::ComputeError),
    Json(serde_json::Error),
    Validation(headache_trends::ValidationError),
}

impl From<io::Error> for TrendsCliError {
    fn from(e: io::Error) -> Self {
        TrendsCliError::Io(e)
    }
}

impl From<headache_trends::ComputeError> for TrendsCliError {
    fn from(e: headache_trends::ComputeError) -> Self {
        TrendsCliError::Compute(e)
    }
}

impl From<serde_json::Error> for TrendsCliError {
    fn from(e: serde_json::Error) -> Self {
        TrendsCliError::Json(e)
    }
}

impl From<headache_trends::ValidationError> for TrendsCliError {
    fn from(e: headache_trends::ValidationError) -> Self {
        TrendsCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrendsCliError> for CliError {
    fn from(e: TrendsCliError) -> Self {
        use headache_trends::ComputeError;

        match e {
            TrendsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrendsCliError::Compute(e @ ComputeError::InvalidReferenceTime(_)) => CliError {
                code: "INVALID_NOW".to_string(),
                message: e.to_string(),
                hint: Some("Use YYYY-MM-DDTHH:MM:SS, e.g. 2025-11-12T22:00:00".to_string()),
            },
            TrendsCliError::Compute(e @ ComputeError::WindowArithmetic(_)) => CliError {
                code: "WINDOW_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Pick a reference time inside the calendar range".to_string()),
            },
            TrendsCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that --format matches the input shape".to_string()),
            },
            TrendsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrendsCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("A date and a pain level between 0 and 10 are required".to_string()),
            },
        }
    }
}
