//! Access token resolution.

use tracing::debug;

use crate::config::{env_var, MastodonConfig};
use crate::db::{Database, SettingRepository, ACCESS_TOKEN_KEY};
use crate::{AppError, Result};

/// Find the access token to post with.
///
/// A token in the configuration wins over one stored by the `code` command.
pub async fn resolve_access_token(config: &MastodonConfig, db: &Database) -> Result<String> {
    let configured = config.access_token.trim();
    if !configured.is_empty() {
        debug!("Using access token from configuration");
        return Ok(configured.to_string());
    }

    let stored = SettingRepository::new(db.pool())
        .get(ACCESS_TOKEN_KEY)
        .await?
        .filter(|token| !token.trim().is_empty());

    match stored {
        Some(token) => {
            debug!("Using access token from database");
            Ok(token)
        }
        None => Err(AppError::Validation(format!(
            "no access token: set mastodon.access_token or {}, or run the link and code commands",
            env_var("ACCESS_TOKEN")
        ))),
    }
}

/// Store a token obtained through the OAuth flow.
pub async fn store_access_token(db: &Database, token: &str) -> Result<()> {
    SettingRepository::new(db.pool())
        .set(ACCESS_TOKEN_KEY, token)
        .await
}
