//! `link` and `code`: the out-of-band OAuth flow.

use tracing::info;

use crate::config::env_var;
use crate::mastodon::{store_access_token, MastodonClient};
use crate::{AppError, Config, Database, Result};

/// Build the authorization URL the user opens in a browser.
pub fn link(config: &Config) -> Result<String> {
    config.validate_for_post()?;
    require_setting("mastodon.client_id", "MASTODON_CLIENT_ID", &config.mastodon.client_id)?;
    MastodonClient::authorize_url(&config.mastodon.server, &config.mastodon.client_id)
}

/// Exchange `code` for an access token and store it in the database.
pub async fn code(config: &Config, code: &str) -> Result<()> {
    config.validate_for_post()?;
    require_setting("mastodon.client_id", "MASTODON_CLIENT_ID", &config.mastodon.client_id)?;
    require_setting(
        "mastodon.client_secret",
        "MASTODON_CLIENT_SECRET",
        &config.mastodon.client_secret,
    )?;
    if code.trim().is_empty() {
        return Err(AppError::Validation("authorization code is required".to_string()));
    }

    let db = Database::open(&config.database.path).await?;
    let token = MastodonClient::exchange_code(
        &config.mastodon.server,
        &config.mastodon.client_id,
        &config.mastodon.client_secret,
        code.trim(),
    )
    .await?;

    store_access_token(&db, &token).await?;
    info!("Stored access token");
    db.close().await;
    Ok(())
}

/// Fail with a message naming both the config key and its env variable.
fn require_setting(name: &str, env_key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{name} is required (set it in the config file or {})",
            env_var(env_key)
        )));
    }
    Ok(())
}
