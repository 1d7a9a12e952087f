//! Logging initialization.
//!
//! Installs the global tracing subscriber. The filter honours `RUST_LOG`
//! and falls back to the given default directive when the variable is
//! unset or unparsable.

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// Fails when a subscriber is already installed, so call it once at
/// process start.
pub fn init(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}
