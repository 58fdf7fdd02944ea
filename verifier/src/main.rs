//! `verify-project`: pipeline A.
//!
//! Creates an isolated environment for a project, installs its declared
//! dependencies, then checks each target file (syntax, then import). The
//! verdict is one JSON array on stdout; progress goes to stderr.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use verifier::exit_codes;
use verifier::io::config::load_optional;
use verifier::io::import_check::PythonImporter;
use verifier::io::provision::SubprocessProvisioner;
use verifier::logging;
use verifier::project::{ProjectRequest, run_project};

#[derive(Parser)]
#[command(
    name = "verify-project",
    version,
    about = "Verify Python files import cleanly inside a fresh isolated environment"
)]
struct Cli {
    /// Root directory of the Python project.
    project_dir: PathBuf,
    /// Where to create the temporary isolated environment (removed afterwards).
    venv_path: PathBuf,
    /// Files to check, relative to the project root.
    #[arg(required = true)]
    target_files: Vec<PathBuf>,
    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::PROVISION_FAILED);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_optional(cli.config.as_deref())?;
    let request = ProjectRequest {
        project_root: cli.project_dir,
        env_path: cli.venv_path,
        target_files: cli.target_files,
    }
    .absolute()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_project(
        &request,
        &cfg,
        &SubprocessProvisioner,
        &PythonImporter,
        &mut out,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positional_arguments() {
        let cli = Cli::parse_from(["verify-project", "proj", "venv", "a.py", "pkg/b.py"]);
        assert_eq!(cli.project_dir, PathBuf::from("proj"));
        assert_eq!(cli.venv_path, PathBuf::from("venv"));
        assert_eq!(
            cli.target_files,
            vec![PathBuf::from("a.py"), PathBuf::from("pkg/b.py")]
        );
        assert!(cli.config.is_none());
    }

    #[test]
    fn requires_at_least_one_target() {
        assert!(Cli::try_parse_from(["verify-project", "proj", "venv"]).is_err());
    }
}
