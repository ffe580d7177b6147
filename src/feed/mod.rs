//! Feed module for feed-to-mastodon.
//!
//! This module fetches RSS/Atom feeds, derives entry ids, and reconciles
//! feed snapshots with the entry store.

pub mod fetcher;
pub mod identity;
pub mod service;
pub mod types;

pub use fetcher::{parse_feed, validate_url, FeedFetcher};
pub use identity::entry_id;
pub use service::IngestService;
pub use types::{Feed, FeedItem, FeedMetadata, MAX_FEED_SIZE};
