//! Deterministic, pure logic shared by both verification pipelines.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod module_name;
pub mod stages;
pub mod targets;
pub mod types;
