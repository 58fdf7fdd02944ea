//! Pipeline B: syntax check, then a static semantic check with an external
//! linter. No isolated environment; the file's code is never executed.

use std::path::{Path, PathBuf};

use crate::core::stages::{Stage, StageOutcome, run_stages};
use crate::core::types::{HealthReport, HealthStatus};
use crate::io::config::VerifierConfig;
use crate::io::lint::{LintRequest, LintRunner, check_semantics};
use crate::io::syntax::check_syntax;

/// Message reported when `detect-health` gets no file path.
pub const MISSING_PATH_MESSAGE: &str = "Missing file path argument";

/// Check one file. Status precedence: `syntax_error`, `error`, `semantic_error`, `ok`.
///
/// `extra_path` is added to the linter's module search path only.
pub fn check_health<L: LintRunner>(
    linter: &L,
    path: &Path,
    cfg: &VerifierConfig,
    extra_path: Option<&Path>,
) -> HealthReport {
    let stages: Vec<Stage<'_, HealthStatus>> = vec![
        Box::new(|| match check_syntax(path) {
            Some(message) => StageOutcome::fail(HealthStatus::SyntaxError, message),
            None => StageOutcome::Pass,
        }),
        Box::new(|| {
            let request = LintRequest {
                python: cfg.python.clone(),
                module: cfg.linter.module.clone(),
                path: path.to_path_buf(),
                extra_path: extra_path.map(PathBuf::from),
            };
            check_semantics(linter, &request)
        }),
    ];
    HealthReport::from_outcome(run_stages(stages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedLinter, TestProject};
    use std::io;

    #[test]
    fn syntax_error_never_reaches_linter() {
        let project = TestProject::new().expect("project");
        let path = project.write("bad.py", "def f(:\n").expect("write");
        let linter = ScriptedLinter::reporting(Some(0), "");

        let report = check_health(&linter, &path, &VerifierConfig::default(), None);
        assert_eq!(report.status, HealthStatus::SyntaxError);
        assert_eq!(linter.calls(), 0);
    }

    #[test]
    fn clean_file_is_ok_without_message() {
        let project = TestProject::new().expect("project");
        let path = project.write("ok.py", "x = 1\n").expect("write");
        let linter = ScriptedLinter::reporting(Some(0), "");

        let report = check_health(&linter, &path, &VerifierConfig::default(), None);
        assert_eq!(report.status, HealthStatus::Ok);
        assert_eq!(report.message, None);
        assert_eq!(linter.calls(), 1);
    }

    #[test]
    fn findings_are_semantic_errors() {
        let project = TestProject::new().expect("project");
        let path = project.write("unused.py", "import os\n").expect("write");
        let linter = ScriptedLinter::reporting(Some(1), "unused.py:1:1: 'os' imported but unused\n");

        let report = check_health(&linter, &path, &VerifierConfig::default(), None);
        assert_eq!(report.status, HealthStatus::SemanticError);
        assert_eq!(
            report.message.as_deref(),
            Some("unused.py:1:1: 'os' imported but unused")
        );
    }

    #[test]
    fn linter_launch_failure_is_error() {
        let project = TestProject::new().expect("project");
        let path = project.write("ok.py", "x = 1\n").expect("write");
        let linter = ScriptedLinter::failing_to_launch(io::ErrorKind::NotFound);

        let report = check_health(&linter, &path, &VerifierConfig::default(), None);
        assert_eq!(report.status, HealthStatus::Error);
        assert!(report.message.is_some());
    }

    #[test]
    fn extra_path_is_forwarded_to_linter() {
        let project = TestProject::new().expect("project");
        let path = project.write("ok.py", "x = 1\n").expect("write");
        let deps = project.path().join("deps");
        let linter = ScriptedLinter::reporting(Some(0), "");

        check_health(&linter, &path, &VerifierConfig::default(), Some(&deps));
        assert_eq!(linter.extra_paths(), vec![Some(deps)]);
    }
}
