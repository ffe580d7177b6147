//! Feed fetcher with resource limits.
//!
//! This module fetches RSS/Atom feeds over HTTP and parses them with
//! feed-rs into [`Feed`] values.

use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;
use tracing::debug;

use crate::config::FeedConfig;
use crate::error::{AppError, Result};
use crate::feed::types::{Feed, FeedItem};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("feed-to-mastodon/", env!("CARGO_PKG_VERSION"));

/// Feed fetcher.
pub struct FeedFetcher {
    client: Client,
    max_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher from the feed configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse a feed from the given URL.
    ///
    /// Network errors, non-2xx responses, oversized bodies and unparseable
    /// documents are all [`AppError::Fetch`]. A valid feed without items is
    /// not an error.
    pub async fn fetch(&self, url: &str) -> Result<Feed> {
        validate_url(url)?;
        debug!(url, "Fetching feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("failed to fetch feed: {}", e)))?;

        // Check response status
        if !response.status().is_success() {
            return Err(AppError::Fetch(format!("HTTP error: {}", response.status())));
        }

        // Check content length if available
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(AppError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Fetch(format!("failed to read response: {}", e)))?;

        // Check actual size
        if bytes.len() as u64 > self.max_size {
            return Err(AppError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Validate a feed URL.
///
/// The URL must use http or https and name a host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|e| AppError::Fetch(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::Fetch(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(AppError::Fetch("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse feed bytes into a [`Feed`].
///
/// Items without a feed-supplied id keep an empty `guid`, so the identity
/// fallback can tell them apart from items that have one.
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    let feed = parser::Builder::new()
        .id_generator(|_links, _title, _uri| String::new())
        .build()
        .parse(bytes)
        .map_err(|e| AppError::Fetch(format!("failed to parse feed: {}", e)))?;

    let title = feed.title.map(|t| t.content).unwrap_or_default();
    let description = feed.description.map(|d| d.content).unwrap_or_default();
    let link = feed
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let language = feed.language.unwrap_or_default();

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            // feed-rs only exposes parsed dates, so the textual form is RFC 3339.
            let published_at = entry.published.or(entry.updated);
            FeedItem {
                guid: entry.id,
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                link: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                description: entry.summary.map(|t| t.content).unwrap_or_default(),
                content: entry.content.and_then(|c| c.body).unwrap_or_default(),
                author: entry
                    .authors
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                categories: entry
                    .categories
                    .into_iter()
                    .map(|c| c.label.unwrap_or(c.term))
                    .collect(),
                published: published_at.map(|dt| dt.to_rfc3339()),
                published_at,
                updated_at: entry.updated,
            }
        })
        .collect();

    Ok(Feed {
        title,
        link,
        description,
        language,
        items,
    })
}
