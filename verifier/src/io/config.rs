//! Verifier configuration, optionally loaded from a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Verifier configuration (TOML).
///
/// Missing fields default to the values the pipelines were designed around,
/// so an absent or empty file reproduces the standard behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifierConfig {
    /// Ambient interpreter used to create environments and run the linter.
    pub python: String,

    /// Hard wall-clock limit for each import attempt, in seconds.
    pub import_timeout_secs: u64,

    /// Truncate captured import output beyond this many bytes per stream.
    pub output_limit_bytes: usize,

    /// Recognized dependency-declaration file names, in priority order.
    pub dependency_files: Vec<String>,

    /// Upgrade the package installer before installing dependencies.
    pub upgrade_installer: bool,

    pub linter: LinterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinterConfig {
    /// Module invoked as `python -m <module> <path>`.
    pub module: String,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            module: "pyflakes".to_string(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            python: default_python().to_string(),
            import_timeout_secs: 15,
            output_limit_bytes: 1_000_000,
            dependency_files: vec!["requirements.txt".to_string(), "pyproject.toml".to_string()],
            upgrade_installer: true,
            linter: LinterConfig::default(),
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.python.trim().is_empty() {
            return Err(anyhow!("python must be non-empty"));
        }
        if self.import_timeout_secs == 0 {
            return Err(anyhow!("import_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.dependency_files.is_empty() {
            return Err(anyhow!("dependency_files must be a non-empty array"));
        }
        if self.dependency_files.iter().any(|name| name.trim().is_empty()) {
            return Err(anyhow!("dependency_files entries must be non-empty"));
        }
        if self.linter.module.trim().is_empty() {
            return Err(anyhow!("linter.module must be non-empty"));
        }
        Ok(())
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `VerifierConfig::default()`.
pub fn load_config(path: &Path) -> Result<VerifierConfig> {
    if !path.exists() {
        let cfg = VerifierConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VerifierConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Load config from an optional `--config` path, falling back to defaults.
pub fn load_optional(path: Option<&Path>) -> Result<VerifierConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(VerifierConfig::default()),
    }
}
