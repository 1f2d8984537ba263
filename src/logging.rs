//! Logging setup

use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr, keeping stdout for command output.
///
/// Uses the RUST_LOG environment variable when set. Otherwise defaults to
/// "info", or "debug" when `verbose` is true.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
