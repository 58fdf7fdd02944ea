//! Discovery of Python source files inside a project.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into (compared case-insensitively).
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "venv",
    ".venv",
    "env",
    "deps",
    "site-packages",
    "__pycache__",
    ".git",
];

/// Find `*.py` files under `root`, returned relative to `root` and sorted.
///
/// `extra_excluded` names are skipped in addition to [`DEFAULT_EXCLUDED_DIRS`].
pub fn discover_sources(root: &Path, extra_excluded: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("project root not found or not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry, extra_excluded));
    for entry in walker {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() || !is_python_source(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("relativize {}", entry.path().display()))?;
        files.push(relative.to_path_buf());
    }
    files.sort();
    Ok(files)
}

fn is_excluded(entry: &DirEntry, extra_excluded: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    DEFAULT_EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(extra_excluded.iter().map(String::as_str))
        .any(|excluded| name.eq_ignore_ascii_case(excluded))
}

fn is_python_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}
