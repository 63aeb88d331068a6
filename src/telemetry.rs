//! Tracing subscriber installation for the monitor binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` selects the filter. `json` switches to one JSON object per
/// line for log shippers.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn init(json: bool) -> eyre::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| eyre::eyre!(err))
}
