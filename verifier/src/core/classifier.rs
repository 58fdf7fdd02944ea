//! Classification of captured subprocess output into stage outcomes.
//!
//! Matching on output text is tool- and locale-dependent. All signatures live
//! here so a structured contract can replace them in one place.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::core::stages::StageOutcome;
use crate::core::types::{HealthStatus, ProjectStatus};

/// The only signature that separates environment problems from broken code.
const MISSING_MODULE_SIGNATURE: &str = "ModuleNotFoundError";

static MISSING_MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"No module named ['"]([^'"]+)['"]"#).expect("missing-module regex")
});

/// Finished import attempt, as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRun {
    /// `None` when the child was killed or terminated by a signal.
    pub exit_code: Option<i32>,
    /// Combined stdout + stderr.
    pub output: String,
    pub timed_out: bool,
}

/// Finished linter invocation, as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRun {
    pub exit_code: Option<i32>,
    pub stdout: String,
}

/// True if `output` carries a missing-module error.
pub fn is_missing_module(output: &str) -> bool {
    output.contains(MISSING_MODULE_SIGNATURE)
}

/// Extract the missing module name, for summaries only.
pub fn missing_module_name(output: &str) -> Option<String> {
    MISSING_MODULE_NAME
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Classify an import attempt.
///
/// - timeout: `FAILURE` citing the limit
/// - exit 0: pass
/// - missing-module signature: `DEPENDENCY_FAILURE`
/// - anything else: `RUNTIME_FAILURE`
pub fn classify_import(run: &ImportRun, timeout: Duration) -> StageOutcome<ProjectStatus> {
    if run.timed_out {
        return StageOutcome::fail(
            ProjectStatus::Failure,
            format!(
                "import timed out (exceeded {} seconds)",
                timeout.as_secs()
            ),
        );
    }
    if run.exit_code == Some(0) {
        return StageOutcome::Pass;
    }

    let output = run.output.trim();
    let detail = if output.is_empty() {
        format!("import exited with {} and no output", describe_exit(run.exit_code))
    } else {
        output.to_string()
    };
    if is_missing_module(output) {
        StageOutcome::fail(ProjectStatus::DependencyFailure, detail)
    } else {
        StageOutcome::fail(ProjectStatus::RuntimeFailure, detail)
    }
}

/// Classify a linter invocation.
///
/// Findings on stdout win regardless of exit code; a non-zero exit with no
/// findings means the linter itself failed.
pub fn classify_lint(run: &LintRun) -> StageOutcome<HealthStatus> {
    let findings = run.stdout.trim();
    if !findings.is_empty() {
        return StageOutcome::fail(HealthStatus::SemanticError, findings);
    }
    if run.exit_code != Some(0) {
        return StageOutcome::fail(
            HealthStatus::Error,
            format!(
                "linter execution failed with {}",
                describe_exit(run.exit_code)
            ),
        );
    }
    StageOutcome::Pass
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
