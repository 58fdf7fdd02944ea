//! The disposable isolated interpreter environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// A virtual environment rooted at a fixed path.
///
/// Created by the provisioner, read by every import check, and removed once
/// at the end of the run by [`IsolatedEnv::cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedEnv {
    root: PathBuf,
}

impl IsolatedEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the environment's own interpreter.
    pub fn python(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts").join("python.exe")
        } else {
            self.root.join("bin").join("python")
        }
    }

    /// Recursively delete the environment directory.
    pub fn remove(&self) -> Result<()> {
        if !self.root.exists() {
            debug!(path = %self.root.display(), "environment already absent");
            return Ok(());
        }
        fs::remove_dir_all(&self.root)
            .with_context(|| format!("remove {}", self.root.display()))
    }

    /// Best-effort removal. Failure is reported on stderr and never propagated.
    pub fn cleanup(&self) -> bool {
        match self.remove() {
            Ok(()) => {
                eprintln!(
                    "[CLEANUP] removed temporary environment {}",
                    self.root.display()
                );
                true
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "environment cleanup failed");
                eprintln!(
                    "[CLEANUP_WARN] could not remove temporary environment {}: {:#}",
                    self.root.display(),
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_lives_inside_root() {
        let env = IsolatedEnv::new("/tmp/venv");
        assert!(env.python().starts_with("/tmp/venv"));
        assert!(env.python().to_string_lossy().contains("python"));
    }

    #[test]
    fn cleanup_removes_directory_tree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("venv");
        fs::create_dir_all(root.join("lib/site-packages/pkg")).expect("mkdir");
        fs::write(root.join("lib/site-packages/pkg/mod.py"), "x = 1\n").expect("write");

        let env = IsolatedEnv::new(&root);
        assert!(env.cleanup());
        assert!(!root.exists());
    }

    #[test]
    fn cleanup_of_missing_directory_succeeds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = IsolatedEnv::new(temp.path().join("never-created"));
        assert!(env.cleanup());
    }
}
