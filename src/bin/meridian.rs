//! Meridian CLI - Command-line interface for Meridian Insights
//!
//! Commands:
//! - generate: Run one insight-generation cycle over a JSON request file
//! - validate: Validate a request file without generating insights

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use meridian_insights::pipeline::{generate_insights, GenerateOptions};
use meridian_insights::sentiment::NeutralSentiment;
use meridian_insights::thresholds::ThresholdSnapshot;
use meridian_insights::types::{RawBreathingLog, RawCheckIn, RawJournalEntry};
use meridian_insights::ENGINE_VERSION;

/// Meridian - On-device insight-generation engine for personal work-wellbeing
/// signals
#[derive(Parser)]
#[command(name = "meridian")]
#[command(author = "Meridian Labs")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Generate ranked wellbeing insights from behavioral logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one insight-generation cycle (batch mode)
    Generate {
        /// Input request file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Override the request's window length in days
        #[arg(long)]
        window_days: Option<u32>,

        /// Cap the number of returned insights
        #[arg(long)]
        max_count: Option<usize>,
    },

    /// Validate a request file without generating insights
    Validate {
        /// Input request file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Generation request as serialized by callers
#[derive(serde::Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    check_ins: Vec<RawCheckIn>,
    #[serde(default)]
    breathing_logs: Vec<RawBreathingLog>,
    #[serde(default)]
    journal_entries: Vec<RawJournalEntry>,
    /// End of the current window; defaults to now
    #[serde(default)]
    reference_date: Option<DateTime<Utc>>,
    #[serde(default)]
    window_days: Option<u32>,
    #[serde(default)]
    dismissed_insight_ids: Vec<String>,
    /// Persisted adaptive-threshold snapshot; absent means cold start
    #[serde(default)]
    thresholds: Option<ThresholdSnapshot>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            output,
            window_days,
            max_count,
        } => run_generate(&input, &output, window_days, max_count),
        Commands::Validate { input } => run_validate(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_generate(
    input: &PathBuf,
    output: &PathBuf,
    window_days: Option<u32>,
    max_count: Option<usize>,
) -> Result<(), String> {
    let request = read_request(input)?;

    let mut options = GenerateOptions::new(request.reference_date.unwrap_or_else(Utc::now));
    if let Some(days) = window_days.or(request.window_days) {
        options.window_days = days;
    }
    options.dismissed_insight_ids = request.dismissed_insight_ids.into_iter().collect();
    options.max_count = max_count;

    let outcome = generate_insights(
        &request.check_ins,
        &request.breathing_logs,
        &request.journal_entries,
        &options,
        request.thresholds,
        &NeutralSentiment,
    )
    .map_err(|e| e.to_string())?;

    let json =
        serde_json::to_string_pretty(&outcome).map_err(|e| format!("failed to encode: {e}"))?;
    write_output(output, &json)
}

fn run_validate(input: &PathBuf) -> Result<(), String> {
    let request = read_request(input)?;
    println!(
        "ok: {} check-ins, {} breathing logs, {} journal entries",
        request.check_ins.len(),
        request.breathing_logs.len(),
        request.journal_entries.len()
    );
    Ok(())
}

fn read_request(input: &PathBuf) -> Result<GenerateRequest, String> {
    let content = if input.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buffer
    } else {
        fs::read_to_string(input)
            .map_err(|e| format!("failed to read {}: {e}", input.display()))?
    };

    serde_json::from_str(&content).map_err(|e| format!("invalid request: {e}"))
}

fn write_output(output: &PathBuf, json: &str) -> Result<(), String> {
    if output.as_os_str() == "-" {
        let mut stdout = io::stdout();
        stdout
            .write_all(json.as_bytes())
            .and_then(|_| stdout.write_all(b"\n"))
            .map_err(|e| format!("failed to write stdout: {e}"))
    } else {
        fs::write(output, format!("{json}\n"))
            .map_err(|e| format!("failed to write {}: {e}", output.display()))
    }
}
