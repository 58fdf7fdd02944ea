//! Vendoring the linter into the project's private dependency directory.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::info;
use verifier::io::config::VerifierConfig;
use verifier::io::provision::{ProvisionRunner, linter_install_step};

/// Name of the private dependency directory under the project root.
pub const DEPS_DIR: &str = "deps";

/// Make sure the linter module is importable from `<project>/deps`.
///
/// Installs it with `pip install --target` only when `<deps>/<module>` is
/// absent. Returns the dependency directory to put on the linter's path.
pub fn ensure_linter<R: ProvisionRunner>(
    runner: &R,
    project: &Path,
    cfg: &VerifierConfig,
) -> Result<PathBuf> {
    let deps = project.join(DEPS_DIR);
    let module = &cfg.linter.module;
    if deps.join(module).exists() {
        info!(deps = %deps.display(), module, "linter already vendored");
        return Ok(deps);
    }

    eprintln!("[SETUP] installing {module} into {}", deps.display());
    let step = linter_install_step(&cfg.python, module, &deps);
    match runner.run(&step)? {
        Some(0) => {}
        Some(code) => bail!("failed to install {module} (exit code: {code})"),
        None => bail!("failed to install {module} (terminated by signal)"),
    }
    if !deps.join(module).exists() {
        bail!("{module} not found in {} after install", deps.display());
    }
    Ok(deps)
}
