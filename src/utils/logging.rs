// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Maps the number of `-v` flags to a default filter directive.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Sets up the logging framework using tracing_subscriber.
/// Reads log level filters from the `RUST_LOG` environment variable.
/// Falls back to a level derived from `verbose` if `RUST_LOG` is not set.
pub fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Keep stdout free for the caller
        .init();

    tracing::debug!("Logging setup complete.");
}
