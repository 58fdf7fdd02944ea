//! Verdict types shared by both pipelines.
//!
//! The serialized forms are stable contracts: downstream tooling parses the
//! JSON payload, so variant spellings must not change.

use serde::{Deserialize, Serialize};

use crate::core::stages::StageOutcome;

/// Per-file status for pipeline A (project + isolated environment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// The file cannot be parsed.
    SyntaxError,
    /// The file imports cleanly inside the isolated environment.
    Success,
    /// Import failed because a module is missing from the environment.
    DependencyFailure,
    /// Import failed because of the file's own code.
    RuntimeFailure,
    /// Timeout, launch failure, or module-name derivation failure.
    Failure,
}

/// Per-file status for pipeline B (single-file semantic check).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    SyntaxError,
    /// The linter itself could not run.
    Error,
    /// The linter reported findings.
    SemanticError,
    Ok,
}

/// One element of the pipeline A report.
///
/// `error` is `Some` exactly when `status` is not [`ProjectStatus::Success`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Base name of the target file.
    pub file: String,
    pub status: ProjectStatus,
    pub error: Option<String>,
}

impl FileReport {
    pub fn from_outcome(file: impl Into<String>, outcome: StageOutcome<ProjectStatus>) -> Self {
        let file = file.into();
        match outcome {
            StageOutcome::Pass => Self {
                file,
                status: ProjectStatus::Success,
                error: None,
            },
            StageOutcome::Fail { status, detail } => {
                debug_assert_ne!(status, ProjectStatus::Success);
                Self {
                    file,
                    status,
                    error: Some(detail),
                }
            }
        }
    }

    /// One-line summary for the `[STATUS]` progress line.
    ///
    /// Import failures end with the exception line, so those use the last
    /// line; syntax and generic failures lead with the relevant line.
    pub fn summary_line(&self) -> Option<&str> {
        let error = self.error.as_deref()?;
        let line = match self.status {
            ProjectStatus::DependencyFailure | ProjectStatus::RuntimeFailure => {
                error.lines().rev().find(|line| !line.trim().is_empty())
            }
            _ => error.lines().find(|line| !line.trim().is_empty()),
        };
        Some(line.unwrap_or(error).trim())
    }
}

/// Pipeline B verdict for a single file.
///
/// `message` is omitted from the JSON form when `status` is `ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthReport {
    pub fn from_outcome(outcome: StageOutcome<HealthStatus>) -> Self {
        match outcome {
            StageOutcome::Pass => Self {
                status: HealthStatus::Ok,
                message: None,
            },
            StageOutcome::Fail { status, detail } => Self {
                status,
                message: Some(detail),
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_report_serializes_null_error() {
        let report = FileReport::from_outcome("main.py", StageOutcome::Pass);
        let json = serde_json::to_string(&report).expect("json");
        assert_eq!(json, r#"{"file":"main.py","status":"SUCCESS","error":null}"#);
    }

    #[test]
    fn failure_report_keeps_detail() {
        let report = FileReport::from_outcome(
            "app.py",
            StageOutcome::fail(ProjectStatus::DependencyFailure, "trace\nModuleNotFoundError: x"),
        );
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["status"], "DEPENDENCY_FAILURE");
        assert_eq!(json["error"], "trace\nModuleNotFoundError: x");
    }

    #[test]
    fn summary_line_uses_last_line_for_import_failures() {
        let report = FileReport::from_outcome(
            "app.py",
            StageOutcome::fail(
                ProjectStatus::RuntimeFailure,
                "Traceback (most recent call last):\n  File \"app.py\"\nNameError: name 'x' is not defined\n",
            ),
        );
        assert_eq!(
            report.summary_line(),
            Some("NameError: name 'x' is not defined")
        );
    }

    #[test]
    fn summary_line_uses_first_line_for_syntax_errors() {
        let report = FileReport::from_outcome(
            "bad.py",
            StageOutcome::fail(ProjectStatus::SyntaxError, "SyntaxError: x at line 1\nmore"),
        );
        assert_eq!(report.summary_line(), Some("SyntaxError: x at line 1"));
        let ok = FileReport::from_outcome("ok.py", StageOutcome::Pass);
        assert_eq!(ok.summary_line(), None);
    }

    #[test]
    fn ok_health_report_omits_message() {
        let report = HealthReport::from_outcome(StageOutcome::Pass);
        let json = serde_json::to_string(&report).expect("json");
        assert_eq!(json, r#"{"status":"ok"}"#);

        let report = HealthReport::from_outcome(StageOutcome::fail(
            HealthStatus::SemanticError,
            "a.py:1:1: 'os' imported but unused",
        ));
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["status"], "semantic_error");
        assert_eq!(json["message"], "a.py:1:1: 'os' imported but unused");
    }
}
