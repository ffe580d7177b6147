//! feed-to-mastodon
//!
//! Polls an RSS/Atom feed, keeps its entries in a local SQLite store, and
//! posts unposted entries to Mastodon through a text template.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod mastodon;
pub mod template;

pub use config::Config;
pub use db::{Database, Entry, EntryRepository, EntryStats, SettingRepository};
pub use error::{AppError, Result};
pub use feed::{entry_id, Feed, FeedFetcher, FeedItem, IngestService};
pub use mastodon::{MastodonClient, PostReport, Poster, Publisher, Visibility};
pub use template::PostRenderer;
