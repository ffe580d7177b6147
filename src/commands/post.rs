//! `post`: render the backlog and post it to Mastodon.

use std::fmt;

use tracing::{error, info, warn};

use crate::config::PostConfig;
use crate::db::EntryRepository;
use crate::feed::IngestService;
use crate::mastodon::{resolve_access_token, MastodonClient, PostReport, Poster, Publisher};
use crate::template::PostRenderer;
use crate::{Config, Database, Result};

/// Outcome of a `post` run.
#[derive(Debug, Clone, Default)]
pub struct PostSummary {
    pub dry_run: bool,
    /// Entries selected from the backlog.
    pub attempted: usize,
    pub report: PostReport,
    /// Entries marked as posted in the store.
    pub marked: usize,
}

impl fmt::Display for PostSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempted == 0 {
            writeln!(f, "No unposted entries to post")?;
            return write!(f, "\nRun 'feed-to-mastodon fetch' to fetch new entries");
        }

        let posted = self.report.posted.len();
        let failed = self.report.failures.len();

        if self.dry_run {
            writeln!(f, "DRY RUN: Previewing posts without actually posting")?;
            for (i, entry) in self.report.posted.iter().enumerate() {
                writeln!(f, "\n--- Post {} ({}) ---", i + 1, entry.id)?;
                writeln!(f, "{}", entry.content)?;
            }
            writeln!(f)?;
            write!(f, "DRY RUN: Would have posted {posted} entries")?;
            if failed > 0 {
                write!(f, "\n{failed} entries could not be rendered (see logs for details)")?;
            }
            return write!(f, "\nRemove --dry-run to actually post to Mastodon");
        }

        for entry in &self.report.posted {
            if let Some(url) = &entry.url {
                writeln!(f, "Posted {}: {}", entry.id, url)?;
            }
        }
        write!(f, "Successfully posted {posted} entries to Mastodon")?;
        if failed > 0 {
            write!(f, "\nFailed to post {failed} entries (see logs for details)")?;
        }
        if self.marked < posted {
            write!(
                f,
                "\n{} posted entries could not be marked and may be posted again",
                posted - self.marked
            )?;
        }
        Ok(())
    }
}

/// Post up to `posts` entries (or `post.max_per_run` when not given).
pub async fn run(config: &Config, dry_run: bool, posts: Option<usize>) -> Result<PostSummary> {
    config.validate_for_post()?;

    let db = Database::open(&config.database.path).await?;
    let token = resolve_access_token(&config.mastodon, &db).await?;
    let client = MastodonClient::new(&config.mastodon.server, token)?;
    let poster = Poster::new(
        client,
        config.post.visibility,
        config.post.content_warning().map(str::to_string),
    );

    let limit = posts.unwrap_or(config.post.max_per_run);
    let summary = post_backlog(&db, &poster, &config.post, limit, dry_run).await?;
    db.close().await;
    Ok(summary)
}

/// Load the configured template with the stored feed metadata attached.
pub async fn load_renderer(config: &PostConfig, db: &Database) -> Result<PostRenderer> {
    let mut renderer = PostRenderer::from_file(&config.template_path, config.character_limit)?;
    if let Some(metadata) = IngestService::new(db).load_metadata().await? {
        renderer.set_feed(&metadata);
    }
    Ok(renderer)
}

/// Post the oldest `limit` unposted entries (0 = all) and mark the ones that
/// went out.
pub async fn post_backlog<P: Publisher>(
    db: &Database,
    poster: &Poster<P>,
    config: &PostConfig,
    limit: usize,
    dry_run: bool,
) -> Result<PostSummary> {
    let repo = EntryRepository::new(db.pool());
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let entries = repo.list_unposted(limit).await?;

    if entries.is_empty() {
        return Ok(PostSummary {
            dry_run,
            ..PostSummary::default()
        });
    }
    info!("Found {} unposted entries", entries.len());

    let renderer = load_renderer(config, db).await?;
    let report = poster.post_entries(&entries, &renderer, dry_run).await;

    let mut marked = 0;
    if !dry_run {
        for id in report.posted_ids() {
            match repo.mark_posted(id).await {
                Ok(_) => marked += 1,
                Err(e) if e.is_not_found() => {
                    warn!(entry_id = %id, "Posted entry vanished before it could be marked");
                }
                Err(e) => {
                    error!(entry_id = %id, error = %e, "Failed to mark entry as posted");
                    return Err(e);
                }
            }
        }
    }

    if report.all_failed() {
        warn!("Every selected entry failed to post");
    }

    Ok(PostSummary {
        dry_run,
        attempted: entries.len(),
        report,
        marked,
    })
}
