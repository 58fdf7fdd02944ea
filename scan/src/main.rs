mod bootstrap;
mod cli;
mod discover;
mod report;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use verifier::exit_codes;
use verifier::io::config::load_optional;
use verifier::io::import_check::PythonImporter;
use verifier::io::lint::ModuleLinter;
use verifier::io::provision::SubprocessProvisioner;
use verifier::logging;

#[derive(Parser)]
#[command(name = "scan", version, about = "Project-wide Python source health checks")]
struct Cli {
    /// Optional TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Syntax and linter check for every source file; writes a health report.
    Health {
        project: PathBuf,
        /// Report path (default: <project>/health_report.json).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Also write a CSV report.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Do not vendor the linter into <project>/deps.
        #[arg(long)]
        no_install: bool,
    },
    /// Import every source file inside a fresh isolated environment.
    Verify {
        project: PathBuf,
        /// Isolated environment directory (default: <project>/.scan-verify-env).
        #[arg(long)]
        env: Option<PathBuf>,
    },
    /// Per-status counts of an existing health report.
    Report { path: PathBuf },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FAILED);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Health {
            project,
            report,
            csv,
            no_install,
        } => {
            let cfg = load_optional(cli.config.as_deref())?;
            let opts = cli::HealthOptions {
                project,
                report,
                csv,
                install_linter: !no_install,
            };
            cli::health(&SubprocessProvisioner, &ModuleLinter, &opts, &cfg)?;
            Ok(())
        }
        Command::Verify { project, env } => {
            let cfg = load_optional(cli.config.as_deref())?;
            cli::verify(
                &SubprocessProvisioner,
                &PythonImporter,
                &project,
                env.as_deref(),
                &cfg,
            )?;
            Ok(())
        }
        Command::Report { path } => cli::report(&path),
    }
}
