//! Import verification inside the isolated environment.
//!
//! The child interpreter performs exactly one action, `import <module>`, with
//! the project root prepended to its `PYTHONPATH`. The parent's environment is
//! never modified.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::classifier::{ImportRun, classify_import};
use crate::core::module_name::derive_module_name;
use crate::core::stages::StageOutcome;
use crate::core::types::ProjectStatus;
use crate::io::process::run_command_with_timeout;

/// Parameters for one import attempt.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Interpreter of the isolated environment.
    pub python: PathBuf,
    /// Prepended to the child's module search path.
    pub project_root: PathBuf,
    pub module: String,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Abstraction over running the import subprocess.
pub trait ImportRunner {
    fn run_import(&self, request: &ImportRequest) -> Result<ImportRun>;
}

/// Spawns `<python> -c "import <module>"`.
pub struct PythonImporter;

impl ImportRunner for PythonImporter {
    #[instrument(skip_all, fields(module = %request.module))]
    fn run_import(&self, request: &ImportRequest) -> Result<ImportRun> {
        let python_path = prepend_python_path(&request.project_root, env::var_os("PYTHONPATH"))?;
        let mut cmd = Command::new(&request.python);
        cmd.arg("-c")
            .arg(format!("import {}", request.module))
            .env("PYTHONPATH", python_path);

        let output = run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes)
            .with_context(|| format!("run import of {}", request.module))?;
        debug!(exit_code = ?output.status.code(), timed_out = output.timed_out, "import finished");
        Ok(ImportRun {
            exit_code: output.status.code(),
            output: output.combined_text(),
            timed_out: output.timed_out,
        })
    }
}

/// `project_root` followed by any existing search path entries.
pub fn prepend_python_path(project_root: &Path, existing: Option<OsString>) -> Result<OsString> {
    let mut entries = vec![project_root.to_path_buf()];
    if let Some(existing) = existing.filter(|value| !value.is_empty()) {
        entries.extend(env::split_paths(&existing));
    }
    env::join_paths(entries).context("join PYTHONPATH")
}

/// Stage-2 check for pipeline A.
///
/// Name derivation failures and launch errors become `FAILURE` outcomes; this
/// function never returns an error.
pub fn verify_import<I: ImportRunner>(
    importer: &I,
    python: &Path,
    project_root: &Path,
    file: &Path,
    timeout: Duration,
    output_limit_bytes: usize,
) -> StageOutcome<ProjectStatus> {
    let module = match derive_module_name(project_root, file) {
        Ok(module) => module,
        Err(err) => return StageOutcome::fail(ProjectStatus::Failure, err.message()),
    };

    let request = ImportRequest {
        python: python.to_path_buf(),
        project_root: project_root.to_path_buf(),
        module,
        timeout,
        output_limit_bytes,
    };
    match importer.run_import(&request) {
        Ok(run) => classify_import(&run, timeout),
        Err(err) => StageOutcome::fail(
            ProjectStatus::Failure,
            format!("unexpected execution error: {err:#}"),
        ),
    }
}
