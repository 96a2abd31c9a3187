#![forbid(unsafe_code)]

//! Subscriber setup for the binary. Library crates only emit events.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "IMATH_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install a stderr subscriber filtered by `IMATH_LOG` (default `warn`).
///
/// A second call is a no-op.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_ok() {
        tracing::debug!(message = "logging.init", json);
    }
}
