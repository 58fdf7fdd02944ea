//! Staged health verification for third-party Python source files.
//!
//! Every file goes through the same short-circuiting pipeline: a syntax check
//! first, then a second stage that depends on the pipeline variant.
//!
//! - **[`project`]** (pipeline A): provisions an isolated environment for a
//!   project, installs its declared dependencies, then tries to import each
//!   target file as a module inside that environment.
//! - **[`health`]** (pipeline B): runs an external linter against a single file
//!   with the ambient interpreter, without executing the file.
//!
//! The crate keeps the runner layout:
//!
//! - **[`core`]**: Pure, deterministic logic (module naming, stage driving,
//!   syntax target checks, output classification). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting adapters (subprocesses, filesystem, config).
//!   Every external process sits behind a trait so tests can script it.

pub mod core;
pub mod exit_codes;
pub mod health;
pub mod io;
pub mod logging;
pub mod project;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
