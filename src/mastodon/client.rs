//! HTTP client for the Mastodon API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::types::{NewStatus, PostedStatus, TokenResponse};
use crate::{AppError, Result};

/// Total request timeout in seconds.
const TIMEOUT_SECS: u64 = 30;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("feed-to-mastodon/", env!("CARGO_PKG_VERSION"));

/// Redirect URI for the out-of-band OAuth flow.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// OAuth scopes requested by `link`.
pub const OAUTH_SCOPES: &str = "read write";

/// Something that can publish a status.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, status: &NewStatus) -> Result<PostedStatus>;
}

/// Mastodon API client bound to one server.
pub struct MastodonClient {
    client: Client,
    server: Url,
    access_token: String,
}

impl MastodonClient {
    /// Create a client for `server` authenticating with `access_token`.
    pub fn new(server: &str, access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            server: parse_server(server)?,
            access_token: access_token.into(),
        })
    }

    /// Build the URL the user visits to authorize this application.
    pub fn authorize_url(server: &str, client_id: &str) -> Result<String> {
        let mut url = parse_server(server)?;
        url.set_path("/oauth/authorize");
        url.query_pairs_mut()
            .clear()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", OOB_REDIRECT_URI)
            .append_pair("response_type", "code")
            .append_pair("scope", OAUTH_SCOPES);
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        server: &str,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<String> {
        let url = endpoint(&parse_server(server)?, "/oauth/token")?;

        let response = http_client()?
            .post(url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", OOB_REDIRECT_URI),
                ("code", code),
                ("scope", OAUTH_SCOPES),
            ])
            .send()
            .await
            .map_err(|e| AppError::Dispatch(format!("token request failed: {}", e)))?;

        let response = check_status(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Dispatch(format!("invalid token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(AppError::Dispatch("received empty access token".to_string()));
        }
        Ok(token.access_token)
    }
}

#[async_trait]
impl Publisher for MastodonClient {
    async fn publish(&self, status: &NewStatus) -> Result<PostedStatus> {
        let url = endpoint(&self.server, "/api/v1/statuses")?;
        debug!(%url, visibility = %status.visibility, "Posting status");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(status)
            .send()
            .await
            .map_err(|e| AppError::Dispatch(format!("failed to post status: {}", e)))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Dispatch(format!("invalid status response: {}", e)))
    }
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Dispatch(format!("failed to create HTTP client: {}", e)))
}

fn parse_server(server: &str) -> Result<Url> {
    let url = Url::parse(server)
        .map_err(|e| AppError::Validation(format!("invalid mastodon server URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::Validation(format!(
            "mastodon server must use http or https, not {scheme}"
        ))),
    }
}

fn endpoint(server: &Url, path: &str) -> Result<Url> {
    server
        .join(path)
        .map_err(|e| AppError::Validation(format!("invalid endpoint {path}: {e}")))
}

/// Turn a non-2xx response into a dispatch error carrying the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Dispatch(format!("HTTP {}: {}", status, body.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url() {
        let url = MastodonClient::authorize_url("https://mastodon.example", "abc123").unwrap();
        let parsed = Url::parse(&url).unwrap();

        assert_eq!(parsed.host_str(), Some("mastodon.example"));
        assert_eq!(parsed.path(), "/oauth/authorize");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".to_string(), "abc123".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "read write".to_string())));
        assert!(pairs.contains(&("redirect_uri".to_string(), OOB_REDIRECT_URI.to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
    }

    #[test]
    fn test_authorize_url_replaces_existing_path() {
        let url = MastodonClient::authorize_url("https://mastodon.example/web/home?x=1", "id")
            .unwrap();
        assert!(url.starts_with("https://mastodon.example/oauth/authorize?"));
        assert!(!url.contains("x=1"));
    }

    #[test]
    fn test_invalid_server() {
        assert!(matches!(
            MastodonClient::new("mastodon.example", "token"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            MastodonClient::authorize_url("ftp://mastodon.example", "id"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_endpoint_join() {
        let server = Url::parse("https://mastodon.example").unwrap();
        let url = endpoint(&server, "/api/v1/statuses").unwrap();
        assert_eq!(url.as_str(), "https://mastodon.example/api/v1/statuses");
    }
}
