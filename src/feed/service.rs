//! Ingestion service for feed-to-mastodon.
//!
//! Reconciles a fetched feed snapshot against the entry store: new items are
//! saved, and entries that have dropped out of the feed can be purged.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::db::{Database, EntryRepository, SettingRepository, FEED_METADATA_KEY};
use crate::feed::identity::entry_id;
use crate::feed::types::{Feed, FeedItem, FeedMetadata};
use crate::{AppError, Result};

/// Service for reconciling feeds with the store.
pub struct IngestService<'a> {
    db: &'a Database,
}

impl<'a> IngestService<'a> {
    /// Create a new IngestService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Save every item into the store.
    ///
    /// A failure on one item is logged and skipped. Returns how many items
    /// were saved successfully, counting items that were already known.
    pub async fn save_all(&self, items: &[FeedItem]) -> usize {
        let repo = EntryRepository::new(self.db.pool());
        let mut saved = 0;

        for item in items {
            let id = entry_id(item);

            let data = match serde_json::to_vec(item) {
                Ok(data) => data,
                Err(e) => {
                    warn!(entry_id = %id, error = %e, "Failed to serialize feed item");
                    continue;
                }
            };

            match repo.save(&id, &data).await {
                Ok(inserted) => {
                    if inserted {
                        debug!(entry_id = %id, title = %item.title, "Saved new entry");
                    }
                    saved += 1;
                }
                Err(e) => {
                    warn!(entry_id = %id, error = %e, "Failed to save entry");
                }
            }
        }

        saved
    }

    /// Delete stored entries that are not in the given feed snapshot.
    ///
    /// A missing snapshot is refused, since purging against it would delete
    /// everything. Returns the number of entries removed.
    pub async fn purge_stale(&self, feed: Option<&Feed>) -> Result<u64> {
        let feed = feed.ok_or_else(|| {
            AppError::Validation("refusing to purge without feed data".to_string())
        })?;

        let live: HashSet<String> = feed.items.iter().map(entry_id).collect();

        let repo = EntryRepository::new(self.db.pool());
        let known = repo.all_ids().await?;

        let stale: Vec<&String> = known.difference(&live).collect();
        if stale.is_empty() {
            debug!("No stale entries to purge");
            return Ok(0);
        }

        let purged = repo.delete_many(&stale).await?;
        info!(purged, "Purged entries no longer in the feed");
        Ok(purged)
    }

    /// Persist the feed-level metadata for templates.
    pub async fn record_metadata(&self, feed: &Feed) -> Result<()> {
        let json = serde_json::to_string(&feed.metadata())?;
        SettingRepository::new(self.db.pool())
            .set(FEED_METADATA_KEY, &json)
            .await
    }

    /// Load the last persisted feed metadata, if any.
    ///
    /// Undecodable metadata is logged and treated as absent.
    pub async fn load_metadata(&self) -> Result<Option<FeedMetadata>> {
        let Some(json) = SettingRepository::new(self.db.pool())
            .get(FEED_METADATA_KEY)
            .await?
        else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable feed metadata");
                Ok(None)
            }
        }
    }
}
