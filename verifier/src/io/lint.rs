//! Static semantic checking through an external linter.
//!
//! The linter runs as `python -m <module> <path>` with the ambient interpreter,
//! which avoids depending on the linter's own executable wrapper being
//! launchable.

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, error, instrument};

use crate::core::classifier::{LintRun, classify_lint};
use crate::core::stages::StageOutcome;
use crate::core::types::HealthStatus;
use crate::io::import_check::prepend_python_path;

const ACCESS_DENIED_HINT: &str = "linter_runtime_error: access denied while launching the linter. Check file execution rights.";

/// Parameters for one linter invocation.
#[derive(Debug, Clone)]
pub struct LintRequest {
    pub python: String,
    pub module: String,
    pub path: PathBuf,
    /// Extra module search path (e.g. a project-local linter install).
    pub extra_path: Option<PathBuf>,
}

/// Abstraction over running the linter subprocess.
pub trait LintRunner {
    fn run_lint(&self, request: &LintRequest) -> Result<LintRun>;
}

/// Spawns the linter as a module of the ambient interpreter.
pub struct ModuleLinter;

impl LintRunner for ModuleLinter {
    #[instrument(skip_all, fields(module = %request.module, path = %request.path.display()))]
    fn run_lint(&self, request: &LintRequest) -> Result<LintRun> {
        let mut cmd = Command::new(&request.python);
        cmd.arg("-m")
            .arg(&request.module)
            .arg(&request.path)
            .stdin(Stdio::null());
        if let Some(extra) = &request.extra_path {
            cmd.env(
                "PYTHONPATH",
                prepend_python_path(extra, env::var_os("PYTHONPATH"))?,
            );
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                error!(err = %e, "failed to spawn linter");
                return Err(e).context("spawn linter");
            }
        };
        debug!(exit_code = ?output.status.code(), "linter finished");
        Ok(LintRun {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Stage-2 check for pipeline B. Never returns an error.
pub fn check_semantics<L: LintRunner>(linter: &L, request: &LintRequest) -> StageOutcome<HealthStatus> {
    match linter.run_lint(request) {
        Ok(run) => classify_lint(&run),
        Err(err) => StageOutcome::fail(HealthStatus::Error, launch_failure_message(&err)),
    }
}

/// Render a launch failure, calling out permission problems explicitly.
pub fn launch_failure_message(err: &anyhow::Error) -> String {
    let denied = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io_err| io_err.kind() == io::ErrorKind::PermissionDenied);
    if denied {
        ACCESS_DENIED_HINT.to_string()
    } else {
        format!("linter_runtime_error: {err:#}")
    }
}

/// True if a message is the access-denied hint.
pub fn is_access_denied(message: &str) -> bool {
    message.starts_with(ACCESS_DENIED_HINT)
}
