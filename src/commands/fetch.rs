//! `fetch`: pull the feed and reconcile it into the store.

use std::fmt;

use tracing::info;

use crate::db::{EntryRepository, EntryStats};
use crate::feed::{Feed, FeedFetcher, IngestService};
use crate::{Config, Database, Result};

/// Counts reported by `fetch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSummary {
    pub feed_title: String,
    /// Items in the fetched feed.
    pub in_feed: usize,
    /// Entries that were not in the store before this fetch.
    pub new_entries: i64,
    /// Items that could not be saved.
    pub failed: usize,
    pub purged: u64,
    pub stats: EntryStats,
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Feed: {} ({} entries)", self.feed_title, self.in_feed)?;
        if self.new_entries > 0 {
            writeln!(f, "Fetched {} new entries", self.new_entries)?;
        } else {
            writeln!(f, "No new entries found")?;
        }
        if self.failed > 0 {
            writeln!(f, "Failed to save {} entries (see logs for details)", self.failed)?;
        }
        if self.purged > 0 {
            writeln!(f, "Purged {} entries no longer in the feed", self.purged)?;
        }
        write!(
            f,
            "Database: {} total, {} posted, {} unposted",
            self.stats.total, self.stats.posted, self.stats.unposted
        )?;
        if self.new_entries > 0 {
            write!(f, "\nRun 'feed-to-mastodon status' to see what will be posted")?;
        }
        Ok(())
    }
}

/// Fetch the configured feed and reconcile it into the store.
///
/// Config and store problems and an unreachable feed are errors. Nothing is
/// written when the fetch itself fails.
pub async fn run(config: &Config, no_purge: bool) -> Result<FetchSummary> {
    config.validate_for_fetch()?;

    let db = Database::open(&config.database.path).await?;
    let fetcher = FeedFetcher::new(&config.feed)?;

    info!(url = %config.feed.url, "Fetching feed");
    let feed = fetcher.fetch(&config.feed.url).await?;
    info!(title = %feed.title, items = feed.items.len(), "Fetched feed");

    let summary = reconcile(&db, &feed, config.feed.purge_stale && !no_purge).await?;
    db.close().await;
    Ok(summary)
}

/// Save a fetched feed into the store and optionally purge stale entries.
pub async fn reconcile(db: &Database, feed: &Feed, purge: bool) -> Result<FetchSummary> {
    let entries = EntryRepository::new(db.pool());
    let service = IngestService::new(db);

    let total_before = entries.stats().await?.total;

    service.record_metadata(feed).await?;
    let saved = service.save_all(&feed.items).await;
    let total_after_save = entries.stats().await?.total;

    let purged = if purge {
        service.purge_stale(Some(feed)).await?
    } else {
        0
    };

    let stats = entries.stats().await?;
    info!(
        total = stats.total,
        posted = stats.posted,
        unposted = stats.unposted,
        "Database totals"
    );

    Ok(FetchSummary {
        feed_title: feed.title.clone(),
        in_feed: feed.items.len(),
        new_entries: total_after_save - total_before,
        failed: feed.items.len() - saved,
        purged,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedItem;

    fn feed_of(guids: &[&str]) -> Feed {
        Feed {
            title: "Example".to_string(),
            items: guids
                .iter()
                .map(|g| {
                    FeedItem::new(format!("Item {g}"), format!("https://example.com/{g}"))
                        .with_guid(*g)
                })
                .collect(),
            ..Feed::default()
        }
    }

    #[tokio::test]
    async fn test_reconcile_counts_new_entries() {
        let db = Database::open_in_memory().await.unwrap();

        let summary = reconcile(&db, &feed_of(&["a", "b"]), true).await.unwrap();
        assert_eq!(summary.new_entries, 2);
        assert_eq!(summary.in_feed, 2);
        assert_eq!(summary.stats.unposted, 2);

        let summary = reconcile(&db, &feed_of(&["a", "b", "c"]), true)
            .await
            .unwrap();
        assert_eq!(summary.new_entries, 1);
        assert_eq!(summary.stats.total, 3);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_reconcile_purges_only_when_asked() {
        let db = Database::open_in_memory().await.unwrap();
        reconcile(&db, &feed_of(&["a", "b"]), true).await.unwrap();

        let kept = reconcile(&db, &feed_of(&["b"]), false).await.unwrap();
        assert_eq!(kept.purged, 0);
        assert_eq!(kept.stats.total, 2);

        let purged = reconcile(&db, &feed_of(&["b"]), true).await.unwrap();
        assert_eq!(purged.purged, 1);
        assert_eq!(purged.stats.total, 1);
    }

    #[tokio::test]
    async fn test_reconcile_records_metadata() {
        let db = Database::open_in_memory().await.unwrap();
        reconcile(&db, &feed_of(&["a"]), true).await.unwrap();

        let meta = IngestService::new(&db).load_metadata().await.unwrap().unwrap();
        assert_eq!(meta.title, "Example");
    }

    #[test]
    fn test_summary_display() {
        let summary = FetchSummary {
            feed_title: "Blog".to_string(),
            in_feed: 3,
            new_entries: 0,
            ..FetchSummary::default()
        };
        let text = summary.to_string();
        assert!(text.contains("Feed: Blog (3 entries)"));
        assert!(text.contains("No new entries found"));
        assert!(!text.contains("Purged"));
    }

    #[tokio::test]
    async fn test_run_rejects_missing_feed_url() {
        let config = Config::default();
        let err = run(&config, false).await.unwrap_err();
        assert!(matches!(err, crate::AppError::Validation(_)));
    }
}
