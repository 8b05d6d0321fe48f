//! Tracing setup for binaries built on Lorekeep.
//!
//! Libraries only emit events; installing a subscriber is left to the
//! application. These helpers install the `fmt` subscriber with an
//! `EnvFilter`, so `RUST_LOG` works out of the box.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber with [`DEFAULT_FILTER`].
///
/// Returns `false` if a global subscriber was already installed (a test
/// harness, or a second call); the existing one stays in place.
pub fn init_tracing() -> bool {
    init_tracing_with(DEFAULT_FILTER)
}

/// Installs the global subscriber, falling back to `default_filter`
/// when `RUST_LOG` is unset or invalid.
pub fn init_tracing_with(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
