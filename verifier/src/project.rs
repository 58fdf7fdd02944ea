//! Pipeline A: provision an isolated environment, then syntax-check and
//! import each target file inside it.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::stages::{Stage, StageOutcome, run_stages};
use crate::core::types::{FileReport, ProjectStatus};
use crate::io::config::VerifierConfig;
use crate::io::env::IsolatedEnv;
use crate::io::import_check::{ImportRunner, verify_import};
use crate::io::provision::{Project, ProvisionRunner, provision_environment};
use crate::io::syntax::check_syntax;

/// Inputs for one pipeline A run.
#[derive(Debug, Clone)]
pub struct ProjectRequest {
    pub project_root: PathBuf,
    pub env_path: PathBuf,
    /// Target files, relative to `project_root`.
    pub target_files: Vec<PathBuf>,
}

impl ProjectRequest {
    /// Resolve the project root and environment path to absolute paths.
    pub fn absolute(self) -> Result<Self> {
        Ok(Self {
            project_root: std::path::absolute(&self.project_root)
                .with_context(|| format!("resolve {}", self.project_root.display()))?,
            env_path: std::path::absolute(&self.env_path)
                .with_context(|| format!("resolve {}", self.env_path.display()))?,
            target_files: self.target_files,
        })
    }
}

/// Run pipeline A end to end and write the JSON report to `out`.
///
/// The environment is removed after the report is emitted, and also when
/// provisioning fails. Only provisioning failures are returned as errors.
#[instrument(skip_all, fields(project = %request.project_root.display()))]
pub fn run_project<P, I, W>(
    request: &ProjectRequest,
    cfg: &VerifierConfig,
    provisioner: &P,
    importer: &I,
    out: &mut W,
) -> Result<Vec<FileReport>>
where
    P: ProvisionRunner,
    I: ImportRunner,
    W: Write,
{
    let env = IsolatedEnv::new(&request.env_path);
    let result = provision_and_check(request, cfg, &env, provisioner, importer, out);
    env.cleanup();
    result
}

fn provision_and_check<P, I, W>(
    request: &ProjectRequest,
    cfg: &VerifierConfig,
    env: &IsolatedEnv,
    provisioner: &P,
    importer: &I,
    out: &mut W,
) -> Result<Vec<FileReport>>
where
    P: ProvisionRunner,
    I: ImportRunner,
    W: Write,
{
    let project = Project::discover(&request.project_root, &cfg.dependency_files);
    if let Err(err) = provision_environment(provisioner, &project, env, cfg) {
        eprintln!("[ERROR] {err:#}");
        return Err(err);
    }

    let reports = check_targets(importer, env, &project.root, &request.target_files, cfg);
    emit_report(out, &reports)?;
    Ok(reports)
}

/// Check every target in input order. One report per target, always.
pub fn check_targets<I: ImportRunner>(
    importer: &I,
    env: &IsolatedEnv,
    project_root: &Path,
    targets: &[PathBuf],
    cfg: &VerifierConfig,
) -> Vec<FileReport> {
    eprintln!(
        "\n[INFO] {} file(s) to check (syntax, then import)...",
        targets.len()
    );
    let python = env.python();
    let reports: Vec<FileReport> = targets
        .iter()
        .map(|relative| {
            let report = check_file(importer, &python, project_root, relative, cfg);
            print_status(&report);
            report
        })
        .collect();
    info!(files = reports.len(), "targets checked");
    reports
}

/// Run the syntax stage, then the import stage if syntax passed.
pub fn check_file<I: ImportRunner>(
    importer: &I,
    python: &Path,
    project_root: &Path,
    relative: &Path,
    cfg: &VerifierConfig,
) -> FileReport {
    let full_path = project_root.join(relative);
    let file_name = full_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| relative.display().to_string());

    let stages: Vec<Stage<'_, ProjectStatus>> = vec![
        Box::new(|| match check_syntax(&full_path) {
            Some(message) => StageOutcome::fail(ProjectStatus::SyntaxError, message),
            None => StageOutcome::Pass,
        }),
        Box::new(|| {
            verify_import(
                importer,
                python,
                project_root,
                &full_path,
                cfg.import_timeout(),
                cfg.output_limit_bytes,
            )
        }),
    ];
    FileReport::from_outcome(file_name, run_stages(stages))
}

/// Write the report as a single-line JSON array.
pub fn emit_report<W: Write>(out: &mut W, reports: &[FileReport]) -> Result<()> {
    let payload = serde_json::to_string(reports).context("serialize report")?;
    writeln!(out, "{payload}").context("write report")?;
    out.flush().context("flush report")?;
    Ok(())
}

fn print_status(report: &FileReport) {
    let summary = report.summary_line().unwrap_or_default();
    match report.status {
        ProjectStatus::Success => eprintln!("[STATUS] ✅ success: {}", report.file),
        ProjectStatus::SyntaxError => {
            eprintln!("[STATUS] ❌ syntax error: {} ({summary})", report.file);
        }
        ProjectStatus::DependencyFailure => {
            eprintln!("[STATUS] ⚠️ dependency failure: {} ({summary})", report.file);
        }
        ProjectStatus::RuntimeFailure => {
            eprintln!("[STATUS] ❌ runtime error: {} ({summary})", report.file);
        }
        ProjectStatus::Failure => eprintln!("[STATUS] ❌ failure: {} ({summary})", report.file),
    }
}
