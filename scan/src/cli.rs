//! CLI command implementations.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};
use verifier::core::types::{FileReport, HealthReport, HealthStatus};
use verifier::health::check_health;
use verifier::io::config::VerifierConfig;
use verifier::io::import_check::ImportRunner;
use verifier::io::lint::{LintRunner, is_access_denied};
use verifier::io::provision::ProvisionRunner;
use verifier::project::{ProjectRequest, run_project};

use crate::bootstrap::ensure_linter;
use crate::discover::discover_sources;
use crate::report::{HealthEntry, aggregate, write_csv, write_json};
use crate::summary::render_summary;

/// Default report file name inside the project root.
pub const HEALTH_REPORT_FILE: &str = "health_report.json";
/// Default isolated environment directory for `scan verify`.
pub const VERIFY_ENV_DIR: &str = ".scan-verify-env";

#[derive(Debug, Clone)]
pub struct HealthOptions {
    pub project: PathBuf,
    pub report: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub install_linter: bool,
}

/// Run pipeline B over every source file in a project and write the reports.
pub fn health<R: ProvisionRunner, L: LintRunner>(
    provisioner: &R,
    linter: &L,
    opts: &HealthOptions,
    cfg: &VerifierConfig,
) -> Result<Vec<HealthEntry>> {
    let started_at = Utc::now();
    let project = &opts.project;
    let deps = if opts.install_linter {
        Some(ensure_linter(provisioner, project, cfg).context("bootstrap linter")?)
    } else {
        None
    };

    let files = discover_sources(project, &[])?;
    info!(project = %project.display(), files = files.len(), "checking health");
    let mut entries = Vec::with_capacity(files.len());
    for relative in files {
        let report = check_health(linter, &project.join(&relative), cfg, deps.as_deref());
        let entry = HealthEntry {
            file: relative.to_string_lossy().replace('\\', "/"),
            report,
        };
        println!("{}", console_line(&entry));
        entries.push(entry);
    }

    let report_path = opts
        .report
        .clone()
        .unwrap_or_else(|| project.join(HEALTH_REPORT_FILE));
    write_json(&report_path, &entries)?;
    if let Some(csv_path) = &opts.csv {
        write_csv(csv_path, &entries)?;
    }

    let damaged = entries
        .iter()
        .filter(|entry| entry.report.status != HealthStatus::Ok)
        .count();
    let elapsed = Utc::now() - started_at;
    println!(
        "health: files={} ok={} damaged={} duration_secs={:.2}",
        entries.len(),
        entries.len() - damaged,
        damaged,
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    println!("health: report={}", report_path.display());
    Ok(entries)
}

/// `✔ OK: name`, or `✘ DAMAGED: name` followed by the indented reason.
pub fn console_line(entry: &HealthEntry) -> String {
    let HealthReport { status, message } = &entry.report;
    if *status == HealthStatus::Ok {
        return format!("✔ OK: {}", entry.file);
    }
    let reason = match message.as_deref() {
        Some(message) if is_access_denied(message) => {
            format!("{message} (permission denied; grant execute rights on the linter and its deps directory)")
        }
        Some(message) => message.to_string(),
        None => format!("{status:?}"),
    };
    format!("✘ DAMAGED: {}\n    Reason: {reason}", entry.file)
}

/// Run pipeline A over every source file in a project and print a summary.
///
/// Returns `Ok(None)` when the project has no source files.
pub fn verify<P: ProvisionRunner, I: ImportRunner>(
    provisioner: &P,
    importer: &I,
    project: &Path,
    env_dir: Option<&Path>,
    cfg: &VerifierConfig,
) -> Result<Option<Vec<FileReport>>> {
    let env_path = env_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project.join(VERIFY_ENV_DIR));
    let env_name = env_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .into_iter()
        .collect::<Vec<_>>();

    let files = discover_sources(project, &env_name)?;
    if files.is_empty() {
        println!("verify: no Python files found in {}", project.display());
        return Ok(None);
    }
    debug!(files = files.len(), env = %env_path.display(), "verifying project");

    let request = ProjectRequest {
        project_root: project.to_path_buf(),
        env_path,
        target_files: files,
    }
    .absolute()?;
    let reports = run_project(&request, cfg, provisioner, importer, &mut io::sink())?;
    print!("{}", render_summary(&reports));
    Ok(Some(reports))
}

/// Print per-status counts of an existing health report.
pub fn report(path: &Path) -> Result<()> {
    let (summary, warnings) = aggregate(path)?;
    println!("report: files={}", summary.files);
    println!(
        "report: ok={} semantic_error={} syntax_error={} error={}",
        summary.ok, summary.semantic_error, summary.syntax_error, summary.error
    );
    for warning in warnings {
        println!("warning: {warning}");
    }
    Ok(())
}
