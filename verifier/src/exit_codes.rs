//! Stable exit codes for the verifier binaries.

/// The run completed, regardless of individual file verdicts.
pub const OK: i32 = 0;
/// `verify-project` could not create the isolated environment or install dependencies.
pub const PROVISION_FAILED: i32 = 1;
/// `detect-health` was invoked without a file path, or failed before checking.
pub const USAGE: i32 = 1;
/// `scan` could not finish a command (bad report file, write failure, provisioning).
pub const FAILED: i32 = 1;
