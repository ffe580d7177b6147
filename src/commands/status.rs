//! `status`: read-only summary of the store.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::db::{Entry, EntryRepository, EntryStats};
use crate::feed::FeedItem;
use crate::{Config, Database, Result};

/// Entries shown in the preview.
pub const PREVIEW_LIMIT: i64 = 5;

/// One line of the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewEntry {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub feed_url: String,
    pub database_path: String,
    pub stats: EntryStats,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_post: Option<DateTime<Utc>>,
    pub preview: Vec<PreviewEntry>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = |t: &Option<DateTime<Utc>>| {
            t.map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        };

        writeln!(f, "Feed to Mastodon Status")?;
        writeln!(f, "=======================")?;
        writeln!(f, "Feed URL: {}", self.feed_url)?;
        writeln!(f, "Database: {}", self.database_path)?;
        writeln!(f)?;
        writeln!(f, "Total entries: {}", self.stats.total)?;
        writeln!(f, "Posted entries: {}", self.stats.posted)?;
        writeln!(f, "Unposted entries: {}", self.stats.unposted)?;
        writeln!(f)?;
        writeln!(f, "Last fetch: {}", when(&self.last_fetch))?;
        writeln!(f, "Last post: {}", when(&self.last_post))?;
        writeln!(f)?;

        if self.stats.unposted == 0 {
            write!(f, "No unposted entries")?;
            if self.stats.total == 0 {
                write!(
                    f,
                    "\n\nRun 'feed-to-mastodon fetch' to fetch entries from the feed"
                )?;
            }
            return Ok(());
        }

        writeln!(f, "Next entries to be posted:")?;
        write!(f, "--------------------------")?;
        for (i, entry) in self.preview.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, entry.title)?;
            if !entry.link.is_empty() {
                write!(f, "\n   {}", entry.link)?;
            }
        }
        // Undecodable entries are left out of the preview but still counted.
        let remaining = self.stats.unposted - self.preview.len() as i64;
        if remaining > 0 {
            write!(f, "\n\n... and {remaining} more")?;
        }
        Ok(())
    }
}

pub async fn run(config: &Config) -> Result<StatusReport> {
    let db = Database::open(&config.database.path).await?;
    let mut report = inspect(&db).await?;
    report.feed_url = config.feed.url.clone();
    report.database_path = config.database.path.clone();
    db.close().await;
    Ok(report)
}

/// Gather counts, timestamps and a preview of the next entries.
pub async fn inspect(db: &Database) -> Result<StatusReport> {
    let repo = EntryRepository::new(db.pool());

    let stats = repo.stats().await?;
    let last_fetch = repo.last_fetch_time().await?;
    let last_post = repo.last_post_time().await?;
    let preview = repo
        .list_unposted(PREVIEW_LIMIT)
        .await?
        .iter()
        .filter_map(preview_entry)
        .collect();

    Ok(StatusReport {
        stats,
        last_fetch,
        last_post,
        preview,
        ..StatusReport::default()
    })
}

fn preview_entry(entry: &Entry) -> Option<PreviewEntry> {
    match serde_json::from_slice::<FeedItem>(&entry.entry_data) {
        Ok(item) => Some(PreviewEntry {
            title: item.title,
            link: item.link,
        }),
        Err(e) => {
            warn!(entry_id = %entry.id, error = %e, "Skipping undecodable entry in preview");
            None
        }
    }
}
