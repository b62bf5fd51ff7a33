//! sleepcalc CLI - Command-line interface for sleepcalc
//!
//! Commands:
//! - duration: Compute the sleep duration between two clock times
//! - stages: Print the stage chart samples for one session
//! - log: Turn submitted sleep entries into records (batch mode)
//! - summary: Summarize a saved sleep log against a nightly goal
//! - doctor: Diagnose configuration and log files

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sleepcalc::history::DEFAULT_SLEEP_GOAL_HOURS;
use sleepcalc::record::parse_date;
use sleepcalc::{
    compute_duration, ComputeError, DateRange, SleepDuration, SleepEntry, SleepInterval, SleepLog,
    StageConfig, StageEstimator, StageSample, TimeOfDay, PRODUCER_NAME, SLEEPCALC_VERSION,
};

/// sleepcalc - Deterministic sleep duration and stage chart computation
#[derive(Parser)]
#[command(name = "sleepcalc")]
#[command(author = "Synheart AI Inc")]
#[command(version = SLEEPCALC_VERSION)]
#[command(about = "Compute sleep durations and stage charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the sleep duration between two clock times
    Duration {
        /// Sleep time (HH:MM, 24-hour)
        #[arg(long)]
        sleep: TimeOfDay,

        /// Wake time (HH:MM, 24-hour)
        #[arg(long)]
        wake: TimeOfDay,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the stage chart samples for one session
    #[command(group(ArgGroup::new("length").required(true).args(["wake", "hours"])))]
    Stages {
        /// Sleep time (HH:MM, 24-hour)
        #[arg(long)]
        sleep: TimeOfDay,

        /// Wake time (HH:MM, 24-hour)
        #[arg(long)]
        wake: Option<TimeOfDay>,

        /// Sleep duration in hours, instead of a wake time
        #[arg(long)]
        hours: Option<f64>,

        /// Stage configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "table")]
        output_format: OutputFormat,
    },

    /// Turn submitted sleep entries into records (batch mode)
    Log {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Only output records for this user
        #[arg(long)]
        user: Option<u64>,

        /// Earliest date to output (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest date to output (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Load an existing sleep log before adding entries
        #[arg(long)]
        load_log: Option<PathBuf>,

        /// Save the sleep log after adding entries
        #[arg(long)]
        save_log: Option<PathBuf>,
    },

    /// Summarize a saved sleep log against a nightly goal
    Summary {
        /// Sleep log file
        #[arg(long)]
        log: PathBuf,

        /// User to summarize
        #[arg(long)]
        user: u64,

        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Nightly goal in hours
        #[arg(long, default_value_t = DEFAULT_SLEEP_GOAL_HOURS)]
        goal: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and log files
    Doctor {
        /// Check a stage configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a sleep log file
        #[arg(long)]
        log: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one entry per line)
    Ndjson,
    /// JSON array of entries
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one item per line)
    Ndjson,
    /// JSON array
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable table
    Table,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), CliAppError> {
    match cli.command {
        Commands::Duration { sleep, wake, json } => cmd_duration(sleep, wake, json),

        Commands::Stages {
            sleep,
            wake,
            hours,
            config,
            output_format,
        } => cmd_stages(sleep, wake, hours, config.as_deref(), output_format),

        Commands::Log {
            input,
            output,
            input_format,
            output_format,
            user,
            from,
            to,
            load_log,
            save_log,
        } => {
            let range = parse_range(from.as_deref(), to.as_deref())?;
            cmd_log(
                &input,
                &output,
                input_format,
                output_format,
                user,
                range,
                load_log.as_deref(),
                save_log.as_deref(),
            )
        }

        Commands::Summary {
            log,
            user,
            from,
            to,
            goal,
            json,
        } => {
            let range = parse_range(from.as_deref(), to.as_deref())?;
            cmd_summary(&log, user, range, goal, json)
        }

        Commands::Doctor { config, log, json } => cmd_doctor(config.as_deref(), log.as_deref(), json),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DurationOutput {
    sleep_time: TimeOfDay,
    wake_time: TimeOfDay,
    crosses_midnight: bool,
    duration: SleepDuration,
    whole_hours: u32,
}

fn cmd_duration(sleep: TimeOfDay, wake: TimeOfDay, json: bool) -> Result<(), CliAppError> {
    let interval = SleepInterval::new(sleep, wake);
    let output = DurationOutput {
        sleep_time: sleep,
        wake_time: wake,
        crosses_midnight: interval.crosses_midnight(),
        duration: compute_duration(sleep, wake),
        whole_hours: interval.whole_hours(),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", output.duration);
    }

    Ok(())
}

fn cmd_stages(
    sleep: TimeOfDay,
    wake: Option<TimeOfDay>,
    hours: Option<f64>,
    config: Option<&Path>,
    output_format: OutputFormat,
) -> Result<(), CliAppError> {
    let estimator = match config {
        Some(path) => StageEstimator::with_config(StageConfig::from_json(&fs::read_to_string(path)?)?)?,
        None => StageEstimator::new(),
    };

    let duration = match (wake, hours) {
        (Some(wake), _) => compute_duration(sleep, wake),
        (None, Some(hours)) => SleepDuration::from_hours(hours)?,
        (None, None) => return Err(CliAppError::MissingArgument("--wake or --hours")),
    };

    let samples: Vec<StageSample> = estimator.estimate(sleep, duration).collect();

    match output_format {
        OutputFormat::Table => {
            println!("{:>5}  {:>6}  {:>5}  {}", "#", "offset", "time", "stage");
            for sample in &samples {
                println!(
                    "{:>5}  {:>6.2}  {:>5}  {}",
                    sample.index,
                    sample.offset_hours,
                    sample.time_label.as_deref().unwrap_or(""),
                    sample.stage
                );
            }
        }
        format => print!("{}", format_output(&samples, &format)?),
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    user: Option<u64>,
    range: DateRange,
    load_log: Option<&Path>,
    save_log: Option<&Path>,
) -> Result<(), CliAppError> {
    let input_data = read_input(input)?;

    let entries = match input_format {
        InputFormat::Ndjson => SleepEntry::parse_ndjson(&input_data)?,
        InputFormat::Json => SleepEntry::parse_array(&input_data)?,
    };

    if entries.is_empty() {
        return Err(CliAppError::NoEntries);
    }

    let mut log = match load_log {
        Some(path) => SleepLog::from_json(&fs::read_to_string(path)?)?,
        None => SleepLog::new(),
    };

    let mut added = Vec::with_capacity(entries.len());
    for entry in entries {
        let record = log.add_entry(entry);
        if user.map_or(true, |u| u == record.user_id) && range.contains(record.date) {
            added.push(record.clone());
        }
    }

    if let Some(path) = save_log {
        fs::write(path, log.to_json()?)?;
    }

    let output_data = match output_format {
        OutputFormat::Table => {
            let mut lines = vec![format!(
                "{:<10}  {:>6}  {:<5}  {:<5}  {:>5}",
                "date", "user", "bed", "wake", "hours"
            )];
            for record in &added {
                lines.push(format!(
                    "{:<10}  {:>6}  {:<5}  {:<5}  {:>5}",
                    record.date, record.user_id, record.bed_time, record.wake_time, record.duration
                ));
            }
            lines.join("\n") + "\n"
        }
        format => format_output(&added, &format)?,
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_summary(
    log_path: &Path,
    user: u64,
    range: DateRange,
    goal: f64,
    json: bool,
) -> Result<(), CliAppError> {
    let log = SleepLog::from_json(&fs::read_to_string(log_path)?)?;
    let summary = log.summary(user, range, goal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Sleep Summary (user {})", summary.user_id);
        println!("==========================");
        println!("Nights:          {}", summary.nights);
        println!("Total hours:     {:.1}", summary.total_hours);
        match summary.average_hours {
            Some(avg) => println!("Average hours:   {:.1}", avg),
            None => println!("Average hours:   -"),
        }
        println!(
            "Goal ({:.1} h):    {} of {} nights",
            summary.goal_hours, summary.nights_meeting_goal, summary.nights
        );
        if let (Some(shortest), Some(longest)) = (summary.shortest, summary.longest) {
            println!("Range:           {} - {} h", shortest, longest);
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, log: Option<&Path>, json: bool) -> Result<(), CliAppError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("sleepcalc version {}", SLEEPCALC_VERSION),
    });

    if let Some(path) = config {
        checks.push(check_file(path, "config", |content| {
            StageConfig::from_json(content).map(|c| {
                format!(
                    "Stage config valid ({} samples/hour, label every {})",
                    c.samples_per_hour, c.label_every
                )
            })
        }));
    }

    if let Some(path) = log {
        checks.push(check_file(path, "log", |content| {
            SleepLog::from_json(content).map(|l| format!("Sleep log valid ({} records)", l.len()))
        }));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input FILE to `log`)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (`log --input -` ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SLEEPCALC_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("sleepcalc Doctor Report");
        println!("=======================");
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
        Err(CliAppError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_file(
    path: &Path,
    name: &str,
    validate: impl FnOnce(&str) -> Result<String, ComputeError>,
) -> DoctorCheck {
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, format!("{} does not exist", path.display()))
    } else {
        match fs::read_to_string(path) {
            Ok(content) => match validate(&content) {
                Ok(message) => (CheckStatus::Ok, message),
                Err(e) => (CheckStatus::Error, e.to_string()),
            },
            Err(e) => (CheckStatus::Error, format!("Cannot read {}: {}", path.display(), e)),
        }
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, CliAppError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange, CliAppError> {
    Ok(DateRange::new(
        from.map(parse_date).transpose()?,
        to.map(parse_date).transpose()?,
    ))
}

fn format_output<T: Serialize>(items: &[T], format: &OutputFormat) -> Result<String, CliAppError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for item in items {
                lines.push(serde_json::to_string(item)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(items)? + "\n"),
        OutputFormat::JsonPretty | OutputFormat::Table => {
            Ok(serde_json::to_string_pretty(items)? + "\n")
        }
    }
}

// Error types

#[derive(Debug)]
enum CliAppError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    MissingArgument(&'static str),
    NoEntries,
    DoctorFailed,
}

impl From<io::Error> for CliAppError {
    fn from(e: io::Error) -> Self {
        CliAppError::Io(e)
    }
}

impl From<ComputeError> for CliAppError {
    fn from(e: ComputeError) -> Self {
        CliAppError::Compute(e)
    }
}

impl From<serde_json::Error> for CliAppError {
    fn from(e: serde_json::Error) -> Self {
        CliAppError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliAppError> for CliError {
    fn from(e: CliAppError) -> Self {
        match e {
            CliAppError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliAppError::Compute(e) => {
                let hint = match &e {
                    ComputeError::InvalidTimeOfDay(_) => "Times must be HH:MM between 00:00 and 23:59",
                    ComputeError::InvalidDuration(_) => "Hours must be between 0 and 24",
                    ComputeError::InvalidConfig(_) => "samples_per_hour must divide 60",
                    ComputeError::InvalidGoal(_) => "--goal must be a positive number of hours",
                    ComputeError::DateParseError(_) => "Dates must be YYYY-MM-DD",
                    _ => "Ensure input entries carry userId, date, bedTime and wakeTime",
                };
                CliError {
                    code: "COMPUTE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CliAppError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliAppError::MissingArgument(arg) => CliError {
                code: "MISSING_ARGUMENT".to_string(),
                message: format!("Missing {}", arg),
                hint: None,
            },
            CliAppError::NoEntries => CliError {
                code: "NO_ENTRIES".to_string(),
                message: "No sleep entries found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CliAppError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
