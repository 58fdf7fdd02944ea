//! Derivation of dotted module names from project-relative file paths.

use std::path::{Component, Path};

const SOURCE_SUFFIX: &str = ".py";
const PACKAGE_INIT: &str = "__init__";

/// Why a module name could not be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleNameError {
    /// The file does not live under the project root.
    OutsideRoot,
    /// The path collapses to an empty name (e.g. a root-level `__init__.py`).
    Empty,
}

impl ModuleNameError {
    pub fn message(self) -> &'static str {
        match self {
            Self::OutsideRoot => "module path conversion failed: file is outside the project root",
            Self::Empty => "cannot derive a valid module name from the file path for import",
        }
    }
}

/// Derive the dotted module name for `file` relative to `project_root`.
///
/// Path separators become dots, a trailing `.py` is stripped, and a trailing
/// `__init__` segment collapses into its package.
pub fn derive_module_name(project_root: &Path, file: &Path) -> Result<String, ModuleNameError> {
    let relative = file
        .strip_prefix(project_root)
        .map_err(|_| ModuleNameError::OutsideRoot)?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(ModuleNameError::OutsideRoot),
        }
    }

    if let Some(last) = segments.last_mut()
        && let Some(stem) = last.strip_suffix(SOURCE_SUFFIX)
    {
        *last = stem.to_string();
    }
    if segments.last().is_some_and(|last| last == PACKAGE_INIT) {
        segments.pop();
    }

    let name = segments.join(".");
    if name.is_empty() {
        return Err(ModuleNameError::Empty);
    }
    Ok(name)
}
