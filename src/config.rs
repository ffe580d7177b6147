//! Configuration module for feed-to-mastodon.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::feed::MAX_FEED_SIZE;
use crate::mastodon::Visibility;
use crate::{AppError, Result};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "feed-to-mastodon.toml";

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "FEED_TO_MASTODON";

/// Feed source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// URL of the RSS/Atom feed.
    #[serde(default)]
    pub url: String,
    /// Delete stored entries that are no longer in the feed after each fetch.
    #[serde(default = "default_purge_stale")]
    pub purge_stale: bool,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
}

fn default_purge_stale() -> bool {
    true
}

fn default_max_feed_size() -> u64 {
    MAX_FEED_SIZE
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            purge_stale: default_purge_stale(),
            max_feed_size_bytes: default_max_feed_size(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
        }
    }
}

/// Mastodon account configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MastodonConfig {
    /// Base URL of the Mastodon server.
    #[serde(default)]
    pub server: String,
    /// Access token. Falls back to the token stored by `code` when empty.
    #[serde(default)]
    pub access_token: String,
    /// OAuth client ID for the `link`/`code` flow.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret for the `code` flow.
    #[serde(default)]
    pub client_secret: String,
}

/// Post rendering and dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostConfig {
    /// Path to the post template.
    #[serde(default = "default_template_path")]
    pub template_path: String,
    /// Advisory character limit for rendered posts.
    #[serde(default = "default_character_limit")]
    pub character_limit: usize,
    /// Visibility of created statuses.
    #[serde(default)]
    pub visibility: Visibility,
    /// Content warning (spoiler text). Empty means none.
    #[serde(default)]
    pub content_warning: String,
    /// Maximum entries to post per run (0 = all).
    #[serde(default)]
    pub max_per_run: usize,
}

fn default_template_path() -> String {
    "post-template.txt".to_string()
}

fn default_character_limit() -> usize {
    500
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            character_limit: default_character_limit(),
            visibility: Visibility::default(),
            content_warning: String::new(),
            max_per_run: 0,
        }
    }
}

impl PostConfig {
    /// Content warning as an option, `None` when blank.
    pub fn content_warning(&self) -> Option<&str> {
        let cw = self.content_warning.trim();
        (!cw.is_empty()).then_some(cw)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "feed-to-mastodon.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Mastodon configuration.
    #[serde(default)]
    pub mastodon: MastodonConfig,
    /// Post configuration.
    #[serde(default)]
    pub post: PostConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AppError::Io)?;
        Self::parse(&content)
    }

    /// Resolve the configuration for a command invocation.
    ///
    /// An explicitly named file must exist. Without one, the default file is
    /// read from the working directory, then from `$HOME/.config/feed-to-mastodon`,
    /// and defaults are used when neither exists. Environment overrides are
    /// applied in every case.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path).map_err(|e| match e {
                AppError::Io(io) => {
                    AppError::Config(format!("cannot read {}: {}", path.display(), io))
                }
                other => other,
            })?,
            None => {
                let home = home_config_dir();
                match find_config_file(Path::new(DEFAULT_CONFIG_FILE), home.as_deref()) {
                    Some(path) => Self::load(path)?,
                    None => Self::default(),
                }
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AppError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Each key maps to `FEED_TO_MASTODON_<SECTION>_<KEY>`:
    /// - `FEED_TO_MASTODON_FEED_URL`
    /// - `FEED_TO_MASTODON_MASTODON_SERVER`
    /// - `FEED_TO_MASTODON_MASTODON_CLIENT_ID`
    /// - `FEED_TO_MASTODON_MASTODON_CLIENT_SECRET`
    /// - `FEED_TO_MASTODON_ACCESS_TOKEN`
    /// - `FEED_TO_MASTODON_POST_TEMPLATE_PATH`
    /// - `FEED_TO_MASTODON_POST_VISIBILITY`
    /// - `FEED_TO_MASTODON_DATABASE_PATH`
    ///
    /// Empty values are ignored. An unknown visibility is a validation error.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let overrides: [(&str, &mut String); 7] = [
            ("FEED_URL", &mut self.feed.url),
            ("MASTODON_SERVER", &mut self.mastodon.server),
            ("MASTODON_CLIENT_ID", &mut self.mastodon.client_id),
            ("MASTODON_CLIENT_SECRET", &mut self.mastodon.client_secret),
            ("ACCESS_TOKEN", &mut self.mastodon.access_token),
            ("POST_TEMPLATE_PATH", &mut self.post.template_path),
            ("DATABASE_PATH", &mut self.database.path),
        ];
        for (key, field) in overrides {
            if let Some(value) = env_value(key) {
                *field = value;
            }
        }
        if let Some(value) = env_value("POST_VISIBILITY") {
            self.post.visibility = value.parse()?;
        }
        Ok(())
    }

    /// Validate the settings the fetch path depends on.
    pub fn validate_for_fetch(&self) -> Result<()> {
        validate_http_url("feed.url", &self.feed.url)
    }

    /// Validate the settings the post path depends on.
    pub fn validate_for_post(&self) -> Result<()> {
        validate_http_url("mastodon.server", &self.mastodon.server)
    }
}

/// Name of the environment variable overriding `key`.
pub fn env_var(key: &str) -> String {
    format!("{ENV_PREFIX}_{key}")
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(env_var(key)).ok().filter(|v| !v.is_empty())
}

/// `$HOME/.config/feed-to-mastodon`, when `HOME` is set.
pub fn home_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join("feed-to-mastodon"))
}

/// First existing config file: `local`, then the default file in `home_dir`.
fn find_config_file(local: &Path, home_dir: Option<&Path>) -> Option<PathBuf> {
    if local.exists() {
        return Some(local.to_path_buf());
    }
    home_dir
        .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Require a non-empty http(s) URL for the named setting.
fn validate_http_url(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} is required")));
    }
    let parsed = url::Url::parse(value)
        .map_err(|e| AppError::Validation(format!("{name} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::Validation(format!(
            "{name} must use http or https, not {scheme}"
        ))),
    }
}
