//! Mastodon module for feed-to-mastodon.
//!
//! This module posts rendered entries to a Mastodon server and handles the
//! out-of-band OAuth flow used to obtain an access token.

pub mod auth;
pub mod client;
pub mod poster;
pub mod types;

pub use auth::{resolve_access_token, store_access_token};
pub use client::{MastodonClient, Publisher, OAUTH_SCOPES, OOB_REDIRECT_URI};
pub use poster::{FailureStage, PostFailure, PostReport, PostedEntry, Poster};
pub use types::{NewStatus, PostedStatus, Visibility};
