//! tracing-subscriber wiring for the binary

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init(verbosity: u8, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = if json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
