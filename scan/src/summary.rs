//! Categorized console summary for `scan verify`.

use std::collections::BTreeMap;
use std::fmt::Write;

use verifier::core::classifier::missing_module_name;
use verifier::core::types::{FileReport, ProjectStatus};

/// Count how often each missing module is named across dependency failures.
pub fn missing_module_tally(reports: &[FileReport]) -> BTreeMap<String, usize> {
    let mut tally = BTreeMap::new();
    for report in reports {
        if report.status != ProjectStatus::DependencyFailure {
            continue;
        }
        if let Some(module) = report.error.as_deref().and_then(missing_module_name) {
            *tally.entry(module).or_insert(0) += 1;
        }
    }
    tally
}

pub fn render_summary(reports: &[FileReport]) -> String {
    let by_status = |wanted: &[ProjectStatus]| -> Vec<&FileReport> {
        reports
            .iter()
            .filter(|report| wanted.contains(&report.status))
            .collect()
    };
    let succeeded = by_status(&[ProjectStatus::Success]);
    let syntax = by_status(&[ProjectStatus::SyntaxError]);
    let dependency = by_status(&[ProjectStatus::DependencyFailure]);
    let runtime = by_status(&[ProjectStatus::RuntimeFailure, ProjectStatus::Failure]);

    let mut text = String::new();
    let _ = writeln!(text, "verify: files={}", reports.len());
    let _ = writeln!(text, "\nSuccessful ({}):", succeeded.len());
    for report in &succeeded {
        let _ = writeln!(text, "  - {}", report.file);
    }
    section(&mut text, "SYNTAX_ERROR", &syntax);
    section(&mut text, "DEPENDENCY_FAILURE", &dependency);
    let tally = missing_module_tally(reports);
    if !tally.is_empty() {
        let _ = writeln!(text, "  missing modules:");
        for (module, count) in &tally {
            let _ = writeln!(text, "    {module}: {count}");
        }
    }
    section(&mut text, "RUNTIME_FAILURE / FAILURE", &runtime);
    text
}

fn section(text: &mut String, title: &str, reports: &[&FileReport]) {
    let _ = writeln!(text, "\n{title} ({}):", reports.len());
    for report in reports {
        match report.summary_line() {
            Some(line) => {
                let _ = writeln!(text, "  - {}: {line}", report.file);
            }
            None => {
                let _ = writeln!(text, "  - {}", report.file);
            }
        }
    }
}
