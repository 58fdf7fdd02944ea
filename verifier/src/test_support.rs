//! Test-only helpers: scripted process seams and scratch projects.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tempfile::TempDir;

use crate::core::classifier::{ImportRun, LintRun};
use crate::io::import_check::{ImportRequest, ImportRunner};
use crate::io::lint::{LintRequest, LintRunner};
use crate::io::provision::{ProvisionRunner, ProvisionStep, StepKind};

/// A scratch project directory removed on drop.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create temp project")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

/// Provisioner that returns queued exit codes (default: success).
///
/// A successful `CreateEnv` step lays down a stub interpreter file so the
/// post-creation check finds it, mirroring a real `venv`. A successful
/// `InstallLinter` step creates the vendored module directory.
pub struct ScriptedProvisioner {
    codes: RefCell<VecDeque<Option<i32>>>,
    steps: RefCell<Vec<ProvisionStep>>,
}

impl ScriptedProvisioner {
    pub fn new(codes: Vec<Option<i32>>) -> Self {
        Self {
            codes: RefCell::new(codes.into()),
            steps: RefCell::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Vec::new())
    }

    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.borrow().iter().map(|step| step.kind).collect()
    }

    pub fn steps(&self) -> Vec<ProvisionStep> {
        self.steps.borrow().clone()
    }
}

impl ProvisionRunner for ScriptedProvisioner {
    fn run(&self, step: &ProvisionStep) -> Result<Option<i32>> {
        self.steps.borrow_mut().push(step.clone());
        let code = self.codes.borrow_mut().pop_front().unwrap_or(Some(0));
        if step.kind == StepKind::CreateEnv && code == Some(0) {
            let root = step
                .args
                .last()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("venv step without target"))?;
            let python = crate::io::env::IsolatedEnv::new(root).python();
            if let Some(parent) = python.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(&python, "").with_context(|| format!("write {}", python.display()))?;
        }
        if step.kind == StepKind::InstallLinter && code == Some(0) {
            let (Some(target), Some(module)) = (step.args.get(4), step.args.last()) else {
                bail!("linter install step without target");
            };
            let vendored = PathBuf::from(target).join(module);
            fs::create_dir_all(&vendored)
                .with_context(|| format!("create {}", vendored.display()))?;
        }
        Ok(code)
    }
}

/// Importer that returns queued results and records requested modules.
///
/// `Err` entries simulate launch failures.
pub struct ScriptedImporter {
    results: RefCell<VecDeque<Result<ImportRun, String>>>,
    modules: RefCell<Vec<String>>,
}

impl ScriptedImporter {
    pub fn new(results: Vec<Result<ImportRun, String>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            modules: RefCell::new(Vec::new()),
        }
    }

    pub fn clean() -> ImportRun {
        ImportRun {
            exit_code: Some(0),
            output: String::new(),
            timed_out: false,
        }
    }

    pub fn missing(module: &str) -> ImportRun {
        ImportRun {
            exit_code: Some(1),
            output: format!(
                "Traceback (most recent call last):\n  File \"<string>\", line 1, in <module>\nModuleNotFoundError: No module named '{module}'\n"
            ),
            timed_out: false,
        }
    }

    pub fn raising(exception_line: &str) -> ImportRun {
        ImportRun {
            exit_code: Some(1),
            output: format!("Traceback (most recent call last):\n  File \"<string>\", line 1, in <module>\n{exception_line}\n"),
            timed_out: false,
        }
    }

    pub fn timed_out() -> ImportRun {
        ImportRun {
            exit_code: None,
            output: String::new(),
            timed_out: true,
        }
    }

    pub fn modules(&self) -> Vec<String> {
        self.modules.borrow().clone()
    }
}

impl ImportRunner for ScriptedImporter {
    fn run_import(&self, request: &ImportRequest) -> Result<ImportRun> {
        self.modules.borrow_mut().push(request.module.clone());
        match self.results.borrow_mut().pop_front() {
            Some(Ok(run)) => Ok(run),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted import result for {}", request.module)),
        }
    }
}

/// Linter that always returns the same result.
pub struct ScriptedLinter {
    result: Result<LintRun, io::ErrorKind>,
    requests: RefCell<Vec<LintRequest>>,
}

impl ScriptedLinter {
    pub fn reporting(exit_code: Option<i32>, stdout: &str) -> Self {
        Self {
            result: Ok(LintRun {
                exit_code,
                stdout: stdout.to_string(),
            }),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_to_launch(kind: io::ErrorKind) -> Self {
        Self {
            result: Err(kind),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn extra_paths(&self) -> Vec<Option<PathBuf>> {
        self.requests
            .borrow()
            .iter()
            .map(|request| request.extra_path.clone())
            .collect()
    }
}

impl LintRunner for ScriptedLinter {
    fn run_lint(&self, request: &LintRequest) -> Result<LintRun> {
        self.requests.borrow_mut().push(request.clone());
        match &self.result {
            Ok(run) => Ok(run.clone()),
            Err(kind) => Err(io::Error::from(*kind)).context("spawn linter"),
        }
    }
}
