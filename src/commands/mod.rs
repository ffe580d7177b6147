//! Command-line surface for feed-to-mastodon.
//!
//! Each subcommand returns a summary that implements `Display`; the caller
//! prints it to stdout. Diagnostics go through `tracing` to stderr.

pub mod auth;
pub mod catchup;
pub mod fetch;
pub mod init;
pub mod post;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{Config, Result};

/// Fetch RSS/Atom feeds and post entries to Mastodon
#[derive(Debug, Parser)]
#[command(name = "feed-to-mastodon", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default is ./feed-to-mastodon.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a config file, a post template and the database
    Init {
        /// Directory to initialize the project in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Fetch feed entries and save them to the database
    Fetch {
        /// Keep entries that are no longer in the feed
        #[arg(long)]
        no_purge: bool,
    },
    /// Post unposted entries to Mastodon
    Post {
        /// Preview posts without posting or marking anything
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of entries to post (0 = all, overrides post.max_per_run)
        #[arg(long, value_name = "N")]
        posts: Option<usize>,
    },
    /// Mark all unposted entries as posted without posting them
    Catchup {
        /// Report how many entries would be marked
        #[arg(long)]
        dry_run: bool,
    },
    /// Show database counts and the next entries to be posted
    Status,
    /// Print the URL that authorizes this application
    Link,
    /// Exchange an authorization code for an access token
    Code {
        /// Code shown by the server after authorizing
        code: String,
    },
}

/// Run one subcommand and print its summary.
pub async fn execute(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Init { directory } => {
            let summary = init::run(&directory).await?;
            println!("{summary}");
        }
        Command::Fetch { no_purge } => {
            let summary = fetch::run(config, no_purge).await?;
            println!("{summary}");
        }
        Command::Post { dry_run, posts } => {
            let summary = post::run(config, dry_run, posts).await?;
            println!("{summary}");
        }
        Command::Catchup { dry_run } => {
            let summary = catchup::run(config, dry_run).await?;
            println!("{summary}");
        }
        Command::Status => {
            let summary = status::run(config).await?;
            println!("{summary}");
        }
        Command::Link => {
            let url = auth::link(config)?;
            println!("Open this URL in your browser to authorize the application:\n");
            println!("{url}\n");
            println!("Then run 'feed-to-mastodon code <authorization-code>'");
        }
        Command::Code { code } => {
            auth::code(config, &code).await?;
            println!("Access token saved to the database");
            println!("You can now run 'feed-to-mastodon post'");
        }
    }
    Ok(())
}
