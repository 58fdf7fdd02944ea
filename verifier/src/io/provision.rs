//! Environment provisioning: create the isolated environment and install the
//! project's declared dependencies into it.
//!
//! Every failure here is fatal for the run. Installation has no partial
//! success: either all steps exit 0 or provisioning returns an error naming
//! the dependency file and the exit status.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, instrument};

use crate::io::config::VerifierConfig;
use crate::io::env::IsolatedEnv;
use crate::io::process::run_command_forwarding;

/// How a dependency-declaration file is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Plain requirements list: `pip install -r <file>`.
    RequirementsList,
    /// Project metadata manifest: `pip install .` from the project root.
    ProjectManifest,
}

impl DependencyKind {
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".txt") {
            Self::RequirementsList
        } else {
            Self::ProjectManifest
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFile {
    pub path: PathBuf,
    pub kind: DependencyKind,
}

impl DependencyFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A project directory and its resolved dependency file, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub dependency_file: Option<DependencyFile>,
}

impl Project {
    /// Resolve the dependency file by trying `candidates` in order.
    pub fn discover(root: &Path, candidates: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            dependency_file: find_dependency_file(root, candidates),
        }
    }
}

/// First existing candidate under `root` wins; absence is not an error.
pub fn find_dependency_file(root: &Path, candidates: &[String]) -> Option<DependencyFile> {
    candidates.iter().find_map(|name| {
        let path = root.join(name);
        path.is_file().then(|| DependencyFile {
            path,
            kind: DependencyKind::from_file_name(name),
        })
    })
}

/// Which provisioning step a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    CreateEnv,
    UpgradeInstaller,
    InstallDependencies,
    /// Vendoring the linter into a private target directory.
    InstallLinter,
}

/// One installer-level subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionStep {
    pub kind: StepKind,
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl ProvisionStep {
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Executes provisioning steps. Returns the exit code (`None` if killed).
pub trait ProvisionRunner {
    fn run(&self, step: &ProvisionStep) -> Result<Option<i32>>;
}

/// Runs steps as real subprocesses, forwarding their output to stderr.
pub struct SubprocessProvisioner;

impl ProvisionRunner for SubprocessProvisioner {
    fn run(&self, step: &ProvisionStep) -> Result<Option<i32>> {
        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args);
        if let Some(cwd) = &step.cwd {
            cmd.current_dir(cwd);
        }
        let status = run_command_forwarding(cmd).with_context(|| format!("run {}", step.display()))?;
        Ok(status.code())
    }
}

pub fn create_env_step(python: &str, env: &IsolatedEnv) -> ProvisionStep {
    ProvisionStep {
        kind: StepKind::CreateEnv,
        program: python.into(),
        args: vec!["-m".into(), "venv".into(), env.root().into()],
        cwd: None,
    }
}

pub fn upgrade_installer_step(env: &IsolatedEnv) -> ProvisionStep {
    ProvisionStep {
        kind: StepKind::UpgradeInstaller,
        program: env.python().into(),
        args: ["-m", "pip", "install", "--upgrade", "pip"]
            .into_iter()
            .map(OsString::from)
            .collect(),
        cwd: None,
    }
}

pub fn install_step(env: &IsolatedEnv, project: &Path, dep: &DependencyFile) -> ProvisionStep {
    let mut args: Vec<OsString> = ["-m", "pip", "install"]
        .into_iter()
        .map(OsString::from)
        .collect();
    match dep.kind {
        DependencyKind::RequirementsList => {
            args.push("-r".into());
            args.push(dep.path.clone().into());
        }
        DependencyKind::ProjectManifest => args.push(".".into()),
    }
    ProvisionStep {
        kind: StepKind::InstallDependencies,
        program: env.python().into(),
        args,
        cwd: Some(project.to_path_buf()),
    }
}

/// `pip install --target <target> <module>` with the ambient interpreter.
pub fn linter_install_step(python: &str, module: &str, target: &Path) -> ProvisionStep {
    ProvisionStep {
        kind: StepKind::InstallLinter,
        program: python.into(),
        args: vec![
            "-m".into(),
            "pip".into(),
            "install".into(),
            "--target".into(),
            target.into(),
            module.into(),
        ],
        cwd: None,
    }
}

/// Create `env` and install `project`'s dependencies into it.
///
/// With no dependency file, only the environment is created.
#[instrument(skip_all, fields(project = %project.root.display(), env = %env.root().display()))]
pub fn provision_environment<R: ProvisionRunner>(
    runner: &R,
    project: &Project,
    env: &IsolatedEnv,
    cfg: &VerifierConfig,
) -> Result<()> {
    eprintln!(
        "[VENV_SETUP] creating isolated environment at {}",
        env.root().display()
    );
    let create = create_env_step(&cfg.python, env);
    match runner.run(&create) {
        Ok(Some(0)) => {}
        Ok(code) => bail!(
            "cannot create isolated environment at {} ({})",
            env.root().display(),
            describe_code(code)
        ),
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "cannot create isolated environment at {}",
                    env.root().display()
                )
            });
        }
    }

    let python = env.python();
    if !python.exists() {
        bail!(
            "interpreter not found in isolated environment: {}",
            python.display()
        );
    }
    debug!(python = %python.display(), "environment created");

    let Some(dep) = &project.dependency_file else {
        eprintln!("[DEP_INSTALL] no dependency file found, skipping installation");
        return Ok(());
    };

    let dep_name = dep.file_name();
    eprintln!("[DEP_INSTALL] found dependency file '{dep_name}', installing...");

    let mut steps = Vec::new();
    if cfg.upgrade_installer {
        steps.push(upgrade_installer_step(env));
    }
    steps.push(install_step(env, &project.root, dep));

    for step in &steps {
        let code = runner
            .run(step)
            .with_context(|| format!("dependency installation failed (file: {dep_name})"))?;
        if code != Some(0) {
            return Err(anyhow!(
                "dependency installation failed (file: {dep_name}, {})",
                describe_code(code)
            ));
        }
    }

    info!(dependency_file = %dep_name, "dependencies installed");
    eprintln!("[DEP_INSTALL] dependencies installed");
    Ok(())
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code: {code}"),
        None => "terminated by signal".to_string(),
    }
}
