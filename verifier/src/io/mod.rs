//! Side-effecting adapters: subprocesses, filesystem, configuration.

pub mod config;
pub mod env;
pub mod import_check;
pub mod lint;
pub mod process;
pub mod provision;
pub mod syntax;
