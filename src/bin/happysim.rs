//! happysim CLI - Command-line interface for the happiness simulator
//!
//! Commands:
//! - compute: Evaluate a table and print the report (batch mode)
//! - run: Apply table edits from stdin, one report per edit (streaming mode)
//! - validate: Check which rows survive normalization
//! - curve: Print the decay weight reference curve
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use happiness_sim::adapter::{TableAdapter, TableFormat};
use happiness_sim::decay;
use happiness_sim::integrator::StepIntegrator;
use happiness_sim::normalizer::Normalizer;
use happiness_sim::pipeline::{Evaluator, HappinessSession, TableEdit};
use happiness_sim::types::{HappinessReport, Outcome};
use happiness_sim::{ComputeError, SimulatorConfig, PRODUCER_NAME, SIM_VERSION};
use tracing::{debug, warn};

/// happysim - total happiness quantity under the subjective-time law
#[derive(Parser)]
#[command(name = "happysim")]
#[command(version = SIM_VERSION)]
#[command(about = "Integrate a happiness step function against 1/(age+1)", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a table and print the report (batch mode)
    Compute {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "array")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Decimal places for the displayed total
        #[arg(long)]
        precision: Option<usize>,
    },

    /// Apply NDJSON table edits from stdin and print a report after each (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Start from an empty table instead of the configured initial table
        #[arg(long)]
        empty: bool,

        /// Flush output after each report
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Check which table rows survive normalization
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "array")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the decay weight reference curve
    Curve {
        /// First age of the curve
        #[arg(long)]
        start: Option<f64>,

        /// Last age of the curve
        #[arg(long)]
        end: Option<f64>,

        /// Number of samples
        #[arg(long)]
        samples: Option<usize>,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON array of {age, happiness} rows
    Array,
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// Column object {"Age": [...], "Happiness": [...]}
    Columns,
}

impl From<InputFormat> for TableFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Array => TableFormat::Array,
            InputFormat::Ndjson => TableFormat::Ndjson,
            InputFormat::Columns => TableFormat::Columns,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON, one report per line
    Ndjson,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), SimCliError> {
    match cli.command {
        Commands::Compute {
            input,
            input_format,
            output_format,
            config,
            precision,
        } => cmd_compute(
            &input,
            input_format,
            output_format,
            config.as_deref(),
            precision,
        ),

        Commands::Run {
            output_format,
            config,
            empty,
            flush,
        } => cmd_run(output_format, config.as_deref(), empty, flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Curve {
            start,
            end,
            samples,
            config,
            json,
        } => cmd_curve(start, end, samples, config.as_deref(), json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_compute(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    precision: Option<usize>,
) -> Result<(), SimCliError> {
    let mut config = load_config(config)?;
    if let Some(precision) = precision {
        config.display_precision = precision;
    }
    config.validate()?;

    let input_data = read_input(input)?;
    let rows = TableAdapter::parse(&input_data, input_format.into())?;
    let report = Evaluator::new(&config).evaluate(&rows)?;

    print!("{}", format_report(&report, output_format)?);
    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    config: Option<&Path>,
    empty: bool,
    flush: bool,
) -> Result<(), SimCliError> {
    let config = load_config(config)?;
    let mut session = if empty {
        HappinessSession::with_rows(config, Vec::new())
    } else {
        HappinessSession::new(config)
    };
    debug!(session = %session.id(), "starting edit stream");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // Initial state before any edit
    write!(stdout, "{}", format_report(&session.report()?, output_format)?)?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        // A bad edit is reported and skipped; the session keeps its table
        let edit: TableEdit = match serde_json::from_str(trimmed) {
            Ok(edit) => edit,
            Err(e) => {
                warn!(error = %e, "skipping unparseable edit");
                report_skipped(SimCliError::ParseError(format!("Failed to parse edit: {}", e)));
                continue;
            }
        };

        match session.apply(edit) {
            Ok(report) => {
                write!(stdout, "{}", format_report(&report, output_format)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            Err(e @ ComputeError::InvalidEdit(_)) => {
                warn!(error = %e, "skipping invalid edit");
                report_skipped(SimCliError::Compute(e));
            }
            Err(e) => return Err(e.into()),
        }
    }

    stdout.flush()?;
    Ok(())
}

fn report_skipped(err: SimCliError) {
    if let Ok(line) = serde_json::to_string(&CliError::from(err)) {
        eprintln!("{}", line);
    }
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), SimCliError> {
    let input_data = read_input(input)?;
    let rows = TableAdapter::parse(&input_data, input_format.into())?;
    let table = Normalizer::normalize(&rows);
    let problem = StepIntegrator::segments(&table.samples).err();

    let report = ValidationReport {
        total_rows: rows.len(),
        valid_rows: table.samples.len(),
        dropped_rows: table
            .dropped_rows
            .iter()
            .map(|d| DroppedRowDetail {
                index: d.index,
                reason: format!("{:?}", d.reason),
            })
            .collect(),
        lifespan: table.samples.lifespan(),
        problem: problem.as_ref().map(|e| e.to_string()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Dropped rows: {}", report.dropped_rows.len());
        if let Some(lifespan) = report.lifespan {
            println!("Lifespan:     {}", lifespan);
        }

        if !report.dropped_rows.is_empty() {
            println!("\nDropped:");
            for row in &report.dropped_rows {
                println!("  - Row {}: {}", row.index, row.reason);
            }
        }

        if let Some(problem) = &report.problem {
            println!("\nProblem: {}", problem);
        }
    }

    match problem {
        Some(e) => Err(SimCliError::ValidationFailed(e.to_string())),
        None => Ok(()),
    }
}

fn cmd_curve(
    start: Option<f64>,
    end: Option<f64>,
    samples: Option<usize>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), SimCliError> {
    let mut config = load_config(config)?;
    if let Some(start) = start {
        config.display_domain.0 = start;
    }
    if let Some(end) = end {
        config.display_domain.1 = end;
    }
    if let Some(samples) = samples {
        config.reference_samples = samples;
    }
    config.validate()?;

    let (start, end) = config.display_domain;
    let curve = decay::reference_curve(start, end, config.reference_samples);

    if json {
        println!("{}", serde_json::to_string(&curve)?);
    } else {
        println!("age\tweight");
        for point in &curve {
            println!("{}\t{}", point.age, point.value);
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), SimCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, SIM_VERSION),
    });

    if let Some(config_path) = config {
        if config_path.exists() {
            match SimulatorConfig::load(config_path) {
                Ok(config) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (domain {:?}, {} samples, {} initial rows)",
                        config.display_domain,
                        config.reference_samples,
                        config.initial_table.len()
                    ),
                }),
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist, defaults will be used".to_string(),
            });
        }
    }

    // Sanity-check the integrator on the default table
    let sanity = HappinessSession::default().report()?;
    checks.push(match sanity.outcome {
        Outcome::Ok { display, .. } => DoctorCheck {
            name: "integrator".to_string(),
            status: CheckStatus::Ok,
            message: format!("Default table total {}", display),
        },
        other => DoctorCheck {
            name: "integrator".to_string(),
            status: CheckStatus::Error,
            message: format!("Default table did not integrate: {:?}", other),
        },
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SIM_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("happysim Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SimCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<SimulatorConfig, SimCliError> {
    match path {
        Some(path) => Ok(SimulatorConfig::load(path)?),
        None => Ok(SimulatorConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, SimCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_report(report: &HappinessReport, format: OutputFormat) -> Result<String, SimCliError> {
    match format {
        OutputFormat::Ndjson => Ok(serde_json::to_string(report)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Text => {
            let mut out = String::new();
            match &report.outcome {
                Outcome::Ok { display, .. } => {
                    out.push_str(&format!("Total happiness quantity: {}\n", display));
                }
                Outcome::InsufficientData { warning, .. } | Outcome::DomainError { warning, .. } => {
                    out.push_str(&format!("Warning: {}\n", warning));
                }
            }
            if let Some(lifespan) = report.lifespan {
                out.push_str(&format!("Lifespan: {}\n", lifespan));
            }
            for segment in &report.segments {
                out.push_str(&format!(
                    "  [{}, {}) happiness {} -> {:.5}\n",
                    segment.start_age, segment.end_age, segment.happiness, segment.area
                ));
            }
            if !report.dropped_rows.is_empty() {
                out.push_str(&format!("Dropped rows: {}\n", report.dropped_rows.len()));
            }
            Ok(out)
        }
    }
}

// Error types

#[derive(Debug)]
enum SimCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ValidationFailed(String),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for SimCliError {
    fn from(e: io::Error) -> Self {
        SimCliError::Io(e)
    }
}

impl From<ComputeError> for SimCliError {
    fn from(e: ComputeError) -> Self {
        SimCliError::Compute(e)
    }
}

impl From<serde_json::Error> for SimCliError {
    fn from(e: serde_json::Error) -> Self {
        SimCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SimCliError> for CliError {
    fn from(e: SimCliError) -> Self {
        match e {
            SimCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SimCliError::Compute(e @ ComputeError::ConfigError(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'happysim doctor --config <file>' for details".to_string()),
            },
            SimCliError::Compute(e @ ComputeError::InvalidEdit(_)) => CliError {
                code: "INVALID_EDIT".to_string(),
                message: e.to_string(),
                hint: Some("Row indices are zero-based positions in the current table".to_string()),
            },
            SimCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input rows look like {\"age\": 10, \"happiness\": 0.6}".to_string()),
            },
            SimCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SimCliError::ValidationFailed(msg) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: msg,
                hint: Some("Provide at least two rows with ages above -1".to_string()),
            },
            SimCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            SimCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Edits look like {\"op\": \"update\", \"index\": 0, \"happiness\": 0.9}".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_rows: usize,
    valid_rows: usize,
    dropped_rows: Vec<DroppedRowDetail>,
    lifespan: Option<f64>,
    problem: Option<String>,
}

#[derive(serde::Serialize)]
struct DroppedRowDetail {
    index: usize,
    reason: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
