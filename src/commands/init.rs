//! `init`: scaffold a working directory.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{DatabaseConfig, DEFAULT_CONFIG_FILE};
use crate::template::DEFAULT_TEMPLATE;
use crate::{Database, Result};

/// Configuration written by `init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# feed-to-mastodon configuration

[feed]
# REQUIRED: feed URL to fetch
url = "https://example.com/feed.xml"
# Delete stored entries that are no longer in the feed
purge_stale = true

[mastodon]
# REQUIRED: Mastodon server URL
server = "https://mastodon.social"
# Access token. Leave empty to use the token stored by `link` + `code`.
# Create one at: Preferences > Development > New application (scope write:statuses)
access_token = ""
# Application credentials for `link` + `code`
client_id = ""
client_secret = ""

[post]
template_path = "post-template.txt"
# Advisory limit; longer posts are logged
character_limit = 500
# public, unlisted, private or direct
visibility = "public"
# Spoiler text; empty means none
content_warning = ""
# Entries to post per run (0 = all)
max_per_run = 0

[database]
path = "feed-to-mastodon.db"

[logging]
level = "warn"
"#;

/// Template file name written by `init`.
pub const TEMPLATE_FILE: &str = "post-template.txt";

/// What `init` created or found.
#[derive(Debug, Clone)]
pub struct InitSummary {
    pub config_path: PathBuf,
    pub config_created: bool,
    pub template_path: PathBuf,
    pub template_created: bool,
    pub database_path: PathBuf,
}

impl fmt::Display for InitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |created: bool| if created { "Created" } else { "Kept existing" };
        writeln!(
            f,
            "{} configuration file: {}",
            state(self.config_created),
            self.config_path.display()
        )?;
        writeln!(
            f,
            "{} template file: {}",
            state(self.template_created),
            self.template_path.display()
        )?;
        writeln!(f, "Database ready: {}", self.database_path.display())?;
        writeln!(f)?;
        writeln!(f, "Next steps:")?;
        writeln!(
            f,
            "1. Edit {} with your feed URL and Mastodon server",
            self.config_path.display()
        )?;
        writeln!(
            f,
            "2. Optionally customize the post template in {}",
            self.template_path.display()
        )?;
        writeln!(f, "3. Run 'feed-to-mastodon fetch' to fetch feed entries")?;
        writeln!(f, "4. Run 'feed-to-mastodon status' to see what will be posted")?;
        writeln!(f, "5. Run 'feed-to-mastodon post --dry-run' to test posting")?;
        write!(f, "6. Run 'feed-to-mastodon post' to post to Mastodon")
    }
}

/// Write the default files into `directory` (created if needed) and create
/// the database. Existing files are left alone.
pub async fn run(directory: &Path) -> Result<InitSummary> {
    std::fs::create_dir_all(directory)?;
    let directory = directory.canonicalize()?;
    info!("Initializing feed-to-mastodon project in {}", directory.display());

    let config_path = directory.join(DEFAULT_CONFIG_FILE);
    let config_created = write_if_absent(&config_path, DEFAULT_CONFIG_TOML)?;

    let template_path = directory.join(TEMPLATE_FILE);
    let template_created = write_if_absent(&template_path, DEFAULT_TEMPLATE)?;

    let database_path = directory.join(DatabaseConfig::default().path);
    Database::open(&database_path).await?.close().await;

    Ok(InitSummary {
        config_path,
        config_created,
        template_path,
        template_created,
        database_path,
    })
}

/// Create `path` with `contents` unless it exists. Returns whether it was written.
fn write_if_absent(path: &Path, contents: &str) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("{} already exists", path.display());
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(contents.as_bytes())?;
    info!("Created {}", path.display());
    Ok(true)
}
