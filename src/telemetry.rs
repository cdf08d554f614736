//! Structured logging setup for the inspection CLI.
//!
//! The library itself never installs a global subscriber — only emits
//! `tracing` events — so embedding applications keep control of their own
//! logging stack. This module is for [`crate::bin`]-style binaries that
//! want the same format the rest of the ambient stack uses.

use tracing_subscriber::EnvFilter;

/// Install a env-filterable `tracing` subscriber writing to stderr.
/// Honors `RUST_LOG`, defaulting to `info` when unset or invalid.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
