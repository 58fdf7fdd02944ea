//! `detect-health`: pipeline B.
//!
//! Checks a single file for syntax errors, then runs the linter against it
//! with the ambient interpreter. Prints one JSON object on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use verifier::core::types::HealthReport;
use verifier::exit_codes;
use verifier::health::{MISSING_PATH_MESSAGE, check_health};
use verifier::io::config::load_optional;
use verifier::io::lint::ModuleLinter;
use verifier::logging;

#[derive(Parser)]
#[command(
    name = "detect-health",
    version,
    about = "Syntax and static semantic check for a single Python file"
)]
struct Cli {
    /// Python file to check.
    path: Option<PathBuf>,
    /// Further positional arguments are accepted and ignored.
    #[arg(hide = true)]
    extra: Vec<String>,
    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::USAGE);
        }
    }
}

fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            print_report(&HealthReport::error(usage_message(&err)))?;
            return Ok(exit_codes::USAGE);
        }
    };
    if !cli.extra.is_empty() {
        debug!(ignored = ?cli.extra, "ignoring extra arguments");
    }
    let Some(path) = cli.path else {
        print_report(&HealthReport::error(MISSING_PATH_MESSAGE))?;
        return Ok(exit_codes::USAGE);
    };
    let cfg = load_optional(cli.config.as_deref())?;
    let report = check_health(&ModuleLinter, &path, &cfg, None);
    print_report(&report)?;
    Ok(exit_codes::OK)
}

/// First line of a clap error, without its `error: ` prefix.
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    let line = line.strip_prefix("error: ").unwrap_or(line);
    format!("Invalid arguments: {line}")
}

fn print_report(report: &HealthReport) -> Result<()> {
    let payload = serde_json::to_string(report).context("serialize health report")?;
    println!("{payload}");
    Ok(())
}
