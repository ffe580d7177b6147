//! Logging initialization for feed-to-mastodon.
//!
//! Diagnostics go to stderr so that command summaries on stdout stay clean.

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Pick the effective level from the command-line flags and the configured level.
///
/// `--debug` wins over `--verbose`, which wins over the config file.
pub fn effective_level<'a>(configured: &'a str, verbose: bool, debug: bool) -> &'a str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    }
}

/// Initialize console logging at the given level.
///
/// `RUST_LOG` directives are honoured on top of the level.
pub fn init(level: &str) {
    let level = parse_level(level);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}
