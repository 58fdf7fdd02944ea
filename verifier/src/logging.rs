//! Development-time tracing for debugging the verifier.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not part of the verifier's product output.
//!
//! - **Progress lines (`[VENV_SETUP]`, `[STATUS]`, ...)**: Human-readable status
//!   on stderr, always written, unaffected by `RUST_LOG`.
//!
//! - **Verdict payload**: JSON on stdout, written exactly once per run.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=verifier=debug verify-project ./proj ./tmp-venv app/main.py
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
