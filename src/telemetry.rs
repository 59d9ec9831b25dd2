//! Opt-in tracing subscriber setup.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! application's choice. `init` wires up a sensible default for binaries
//! and examples: env-filtered (`RUST_LOG`), compact, ANSI-colored output.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global fmt subscriber honoring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
