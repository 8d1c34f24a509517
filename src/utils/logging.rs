//! Logging initialization helpers
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the binary (or the embedding application).

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; `default_directive` is used when it is unset.
/// Calling this twice panics, so it must only be called from binary entry points.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}
