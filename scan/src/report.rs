//! Health report files: writing JSON/CSV and aggregating an existing report.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use verifier::core::types::{HealthReport, HealthStatus};

/// Messages longer than this (in chars) are cut in CSV output.
pub const CSV_MESSAGE_LIMIT: usize = 1000;
const TRUNCATED_SUFFIX: &str = "...(truncated)";

/// One file's verdict inside `health_report.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEntry {
    /// Path relative to the project root.
    pub file: String,
    #[serde(flatten)]
    pub report: HealthReport,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    file: &'a str,
    status: HealthStatus,
    message: String,
}

pub fn write_json(path: &Path, entries: &[HealthEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).context("serialize health report")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn write_csv(path: &Path, entries: &[HealthEntry]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for entry in entries {
        writer
            .serialize(CsvRow {
                file: &entry.file,
                status: entry.report.status,
                message: truncate(entry.report.message.as_deref().unwrap_or_default()),
            })
            .with_context(|| format!("write row for {}", entry.file))?;
    }
    writer.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn truncate(message: &str) -> String {
    match message.char_indices().nth(CSV_MESSAGE_LIMIT) {
        Some((cut, _)) => format!("{}{TRUNCATED_SUFFIX}", &message[..cut]),
        None => message.to_string(),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub files: usize,
    pub ok: usize,
    pub semantic_error: usize,
    pub syntax_error: usize,
    pub error: usize,
}

/// Count statuses in a health report. Malformed entries become warnings.
pub fn aggregate(path: &Path) -> Result<(ReportSummary, Vec<String>)> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse {}", path.display()))?;
    let Value::Array(items) = value else {
        bail!("{} is not a JSON array", path.display());
    };

    let mut summary = ReportSummary::default();
    let mut warnings = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let entry: HealthEntry = match serde_json::from_value(item) {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("skip entry {index}: invalid ({err})"));
                continue;
            }
        };
        summary.files += 1;
        match entry.report.status {
            HealthStatus::Ok => summary.ok += 1,
            HealthStatus::SemanticError => summary.semantic_error += 1,
            HealthStatus::SyntaxError => summary.syntax_error += 1,
            HealthStatus::Error => summary.error += 1,
        }
    }
    Ok((summary, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(file: &str, status: HealthStatus, message: Option<&str>) -> HealthEntry {
        HealthEntry {
            file: file.to_string(),
            report: HealthReport {
                status,
                message: message.map(str::to_string),
            },
        }
    }

    #[test]
    fn json_entries_are_flat() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("health_report.json");
        write_json(
            &path,
            &[
                entry("a.py", HealthStatus::Ok, None),
                entry("pkg/b.py", HealthStatus::SemanticError, Some("b.py:1: unused")),
            ],
        )
        .expect("write");

        let value: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(
            value,
            serde_json::json!([
                {"file": "a.py", "status": "ok"},
                {"file": "pkg/b.py", "status": "semantic_error", "message": "b.py:1: unused"}
            ])
        );
    }

    #[test]
    fn truncate_keeps_short_messages() {
        assert_eq!(truncate("short"), "short");
        let exact = "x".repeat(CSV_MESSAGE_LIMIT);
        assert_eq!(truncate(&exact), exact);
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        let long = "é".repeat(CSV_MESSAGE_LIMIT + 5);
        let cut = truncate(&long);
        assert!(cut.ends_with(TRUNCATED_SUFFIX));
        assert_eq!(
            cut.chars().count(),
            CSV_MESSAGE_LIMIT + TRUNCATED_SUFFIX.chars().count()
        );
    }

    #[test]
    fn csv_has_header_and_empty_message_for_ok() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("report.csv");
        write_csv(
            &path,
            &[
                entry("a.py", HealthStatus::Ok, None),
                entry("b.py", HealthStatus::SyntaxError, Some("SyntaxError: bad, at line 1")),
            ],
        )
        .expect("write");

        let text = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "file,status,message");
        assert_eq!(lines[1], "a.py,ok,");
        assert_eq!(lines[2], "b.py,syntax_error,\"SyntaxError: bad, at line 1\"");
    }

    #[test]
    fn aggregate_counts_and_warns() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("health_report.json");
        fs::write(
            &path,
            r#"[
                {"file": "a.py", "status": "ok"},
                {"file": "b.py", "status": "error", "message": "linter_runtime_error: x"},
                {"file": "c.py", "status": "ok"},
                {"file": "d.py", "status": "exploded"},
                42
            ]"#,
        )
        .expect("write");

        let (summary, warnings) = aggregate(&path).expect("aggregate");
        assert_eq!(
            summary,
            ReportSummary {
                files: 3,
                ok: 2,
                error: 1,
                ..ReportSummary::default()
            }
        );
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("skip entry 3"));
    }

    #[test]
    fn aggregate_rejects_non_array() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("health_report.json");
        fs::write(&path, r#"{"status": "ok"}"#).expect("write");
        assert!(aggregate(&path).is_err());
    }
}
