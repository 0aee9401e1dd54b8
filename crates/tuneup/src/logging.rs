//! Diagnostics logging
//!
//! Structured events go to stderr so they never tangle with spinner output
//! on stdout. `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is unset; warnings only, to keep the
/// interactive output clean
const DEFAULT_FILTER: &str = "tuneup=warn";

/// Initialize the global tracing subscriber
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}
