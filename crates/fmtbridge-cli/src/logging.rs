//! Logging setup

use crate::error::{CliError, CliResult};

/// Install a stderr `tracing` subscriber
///
/// `verbose` raises the level to at least `debug` and adds targets, thread
/// ids and source locations.
pub fn init_logging(log_level: &str, verbose: bool) -> CliResult<()> {
    use tracing_subscriber::fmt;

    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    let level = if verbose && level < tracing::Level::DEBUG {
        tracing::Level::DEBUG
    } else {
        level
    };

    fmt()
        .with_max_level(level)
        .with_target(verbose)
        .with_thread_ids(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Internal(format!("Failed to initialize logging: {}", e)))
}
