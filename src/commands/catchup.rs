//! `catchup`: mark the whole backlog as posted without posting it.

use std::fmt;

use tracing::info;

use crate::db::EntryRepository;
use crate::{Config, Database, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchupSummary {
    pub dry_run: bool,
    /// Unposted entries found (dry run) or marked.
    pub count: u64,
}

impl fmt::Display for CatchupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "No unposted entries to mark");
        }
        if self.dry_run {
            writeln!(f, "DRY RUN: Would mark {} entries as posted", self.count)?;
            write!(f, "Remove --dry-run to actually mark entries as posted")
        } else {
            write!(f, "Marked {} entries as posted", self.count)
        }
    }
}

pub async fn run(config: &Config, dry_run: bool) -> Result<CatchupSummary> {
    let db = Database::open(&config.database.path).await?;
    let summary = catch_up(&db, dry_run).await?;
    db.close().await;
    Ok(summary)
}

/// Mark every unposted entry as posted in one statement.
pub async fn catch_up(db: &Database, dry_run: bool) -> Result<CatchupSummary> {
    let repo = EntryRepository::new(db.pool());

    let count = if dry_run {
        repo.stats().await?.unposted.max(0) as u64
    } else {
        let marked = repo.mark_all_posted().await?;
        info!(marked, "Caught up backlog");
        marked
    };

    Ok(CatchupSummary { dry_run, count })
}
