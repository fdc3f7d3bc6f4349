//! `slotfind` CLI: pick a meeting slot for a group of attendees.
//!
//! ## Usage
//!
//! ```sh
//! # Schedule from a JSON request on stdin, print the outcome as JSON
//! slotfind schedule < request.json
//!
//! # Read from a file, prefer the narrowest gap, write to a file
//! slotfind schedule -i request.json --policy tightest-fit -o outcome.json
//!
//! # Human-readable outcome
//! slotfind schedule -i request.json --text
//!
//! # Show each attendee's free time and the common start ranges
//! slotfind free -i request.json
//!
//! # More logging on stderr (RUST_LOG overrides)
//! slotfind -vv schedule -i request.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use tracing::info;
use tracing_subscriber::EnvFilter;

use slot_engine::schedule::{availability_for, schedule_meeting};
use slot_engine::{MeetingRequest, ScheduleOutcome, SelectionPolicy};

#[derive(Parser)]
#[command(
    name = "slotfind",
    version,
    about = "Find the first meeting slot every attendee has free"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose a slot for a JSON meeting request
    Schedule {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Override the request's selection policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
        /// Plain-text outcome instead of JSON
        #[arg(long, conflicts_with = "compact")]
        text: bool,
    },
    /// Print per-attendee free time and the common start ranges
    Free {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Earliest,
    TightestFit,
    History,
}

impl From<PolicyArg> for SelectionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Earliest => SelectionPolicy::Earliest,
            PolicyArg::TightestFit => SelectionPolicy::TightestFit,
            PolicyArg::History => SelectionPolicy::History,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Schedule {
            input,
            output,
            policy,
            compact,
            text,
        } => {
            let mut request = read_request(input.as_deref())?;
            if let Some(policy) = policy {
                request.policy = policy.into();
            }

            let outcome = schedule_meeting(&request).context("Invalid meeting request")?;
            info!(attendees = request.attendees.len(), ?outcome, "request scheduled");

            let rendered = if text {
                render_text(&outcome)
            } else if compact {
                serde_json::to_string(&outcome)?
            } else {
                serde_json::to_string_pretty(&outcome)?
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Free { input } => {
            let request = read_request(input.as_deref())?;
            let report = availability_for(&request).context("Invalid meeting request")?;
            write_output(None, &serde_json::to_string_pretty(&report)?)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render_text(outcome: &ScheduleOutcome) -> String {
    match outcome {
        ScheduleOutcome::Scheduled(slot) => format!(
            "Scheduled: {} to {}\n",
            slot.start.to_rfc3339(),
            slot.end.to_rfc3339()
        ),
        ScheduleOutcome::NoSlotFound => "No free time to assign\n".to_string(),
    }
}

fn read_request(path: Option<&str>) -> Result<MeetingRequest> {
    let json = read_input(path)?;
    serde_json::from_str(&json).context("Failed to parse meeting request JSON")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content.trim_end());
        }
    }
    Ok(())
}
