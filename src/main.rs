use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use feed_to_mastodon::commands::{self, Cli};
use feed_to_mastodon::{logging, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(logging::effective_level(
        &config.logging.level,
        cli.verbose,
        cli.debug,
    ));
    debug!(?cli, "Starting feed-to-mastodon");

    match commands::execute(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
