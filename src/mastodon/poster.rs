//! Posting coordinator.
//!
//! Renders backlog entries and dispatches them one by one. A failure on one
//! entry never stops the batch; the entry simply stays in the backlog.

use std::fmt;

use tracing::{debug, error, info};

use super::client::Publisher;
use super::types::{NewStatus, PostedStatus, Visibility};
use crate::db::Entry;
use crate::template::PostRenderer;
use crate::Result;

/// Stage at which an entry failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Render,
    Dispatch,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Render => f.write_str("render"),
            FailureStage::Dispatch => f.write_str("dispatch"),
        }
    }
}

/// An entry that was dispatched (or would have been, in a dry run).
#[derive(Debug, Clone, PartialEq)]
pub struct PostedEntry {
    pub id: String,
    pub content: String,
    /// Link to the created status. Always `None` in a dry run.
    pub url: Option<String>,
}

/// An entry that could not be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFailure {
    pub id: String,
    pub stage: FailureStage,
    pub message: String,
}

/// Outcome of a posting pass, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostReport {
    pub posted: Vec<PostedEntry>,
    pub failures: Vec<PostFailure>,
}

impl PostReport {
    /// Ids of the entries that were dispatched successfully.
    pub fn posted_ids(&self) -> impl Iterator<Item = &str> {
        self.posted.iter().map(|p| p.id.as_str())
    }

    /// Whether there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.posted.is_empty() && !self.failures.is_empty()
    }
}

/// Posts rendered content through a [`Publisher`].
pub struct Poster<P> {
    publisher: P,
    visibility: Visibility,
    content_warning: Option<String>,
}

impl<P: Publisher> Poster<P> {
    /// Create a poster. A blank content warning is treated as none.
    pub fn new(publisher: P, visibility: Visibility, content_warning: Option<String>) -> Self {
        Self {
            publisher,
            visibility,
            content_warning: content_warning.filter(|cw| !cw.trim().is_empty()),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Post one piece of content.
    ///
    /// In a dry run the publisher is never called and `Ok(None)` is returned,
    /// whatever the content.
    pub async fn post(&self, content: &str, dry_run: bool) -> Result<Option<PostedStatus>> {
        if dry_run {
            info!("Dry run: would post status");
            debug!(content, "Dry run content");
            return Ok(None);
        }

        let status = NewStatus {
            status: content.to_string(),
            visibility: self.visibility,
            spoiler_text: self.content_warning.clone(),
        };

        let posted = self.publisher.publish(&status).await?;
        info!(
            status_id = %posted.id,
            url = posted.url.as_deref().unwrap_or(""),
            "Posted status"
        );
        Ok(Some(posted))
    }

    /// Render and post each entry in order.
    ///
    /// The report names exactly which entries succeeded, so the caller can
    /// mark those and only those as posted. This method does not touch the
    /// store.
    pub async fn post_entries(
        &self,
        entries: &[Entry],
        renderer: &PostRenderer,
        dry_run: bool,
    ) -> PostReport {
        let mut report = PostReport::default();

        for entry in entries {
            let content = match renderer.render(&entry.entry_data) {
                Ok(content) => content,
                Err(e) => {
                    error!(entry_id = %entry.id, error = %e, "Failed to render entry");
                    report.failures.push(PostFailure {
                        id: entry.id.clone(),
                        stage: FailureStage::Render,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            match self.post(&content, dry_run).await {
                Ok(status) => report.posted.push(PostedEntry {
                    id: entry.id.clone(),
                    content,
                    url: status.and_then(|s| s.url),
                }),
                Err(e) => {
                    error!(entry_id = %entry.id, error = %e, "Failed to post entry");
                    report.failures.push(PostFailure {
                        id: entry.id.clone(),
                        stage: FailureStage::Dispatch,
                        message: e.to_string(),
                    });
                }
            }
        }

        if dry_run {
            info!("Dry run: would post {} entries", report.posted.len());
        } else {
            info!(
                "Successfully posted {}/{} entries",
                report.posted.len(),
                entries.len()
            );
        }

        report
    }
}
