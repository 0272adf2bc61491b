use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialize diagnostics on stderr, filtered by `RUST_LOG` (default `warn`).
///
/// stdout carries downloaded content in `--print` mode, so nothing is ever logged there.
pub fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")
}
