//! Tracing subscriber initialization.
//!
//! Structured logging is the only operator-facing surface of this crate:
//! every ignored, conflicted, or rejected reconciliation outcome is reported
//! through `tracing` events carrying the subscription id and reason.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` for filtering; defaults to `info` when unset.
/// Call once at process startup, before the first reconciliation.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Initialize tracing with JSON output for log aggregation pipelines.
pub fn init_tracing_json() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
