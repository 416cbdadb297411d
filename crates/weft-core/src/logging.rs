//! Logging bootstrap.
//!
//! The engine crates use `tracing` throughout (matching the teacher's async
//! crates, e.g. `fluent-pipeline`, rather than the `log`/`env_logger`
//! convention its CLI binary uses). This module wires a sensible default
//! subscriber so a host binary doesn't need to know the detail.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global `tracing` subscriber reading filter directives from
/// `RUST_LOG`, defaulting to `info` when unset.
///
/// Safe to call more than once; subsequent calls are no-ops (the global
/// default subscriber can only be set once per process).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
