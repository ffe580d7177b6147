//! Test helpers for integration tests.
//!
//! Provides sample feeds and a `Publisher` fake that records statuses.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use feed_to_mastodon::config::PostConfig;
use feed_to_mastodon::mastodon::{NewStatus, PostedStatus, Poster, Publisher, Visibility};
use feed_to_mastodon::{AppError, Feed, FeedItem, Result};

/// RSS document with two items, one of them without a guid.
pub const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <link>https://blog.example.com/</link>
    <description>Posts about things</description>
    <language>en</language>
    <item>
      <title>First post</title>
      <link>https://blog.example.com/first</link>
      <guid>https://blog.example.com/?p=1</guid>
      <description>&lt;p&gt;Hello &amp;amp; welcome&lt;/p&gt;</description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second post</title>
      <link>https://blog.example.com/second</link>
      <pubDate>Tue, 07 Jan 2025 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

/// Publisher fake that records every status and rejects chosen texts.
#[derive(Default)]
pub struct FakePublisher {
    sent: Mutex<Vec<NewStatus>>,
    reject: HashSet<String>,
}

impl FakePublisher {
    /// Reject any status whose text contains one of `needles`.
    pub fn rejecting(needles: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: needles.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<NewStatus> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, status: &NewStatus) -> Result<PostedStatus> {
        if self.reject.iter().any(|n| status.status.contains(n.as_str())) {
            return Err(AppError::Dispatch("HTTP 503: unavailable".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(status.clone());
        Ok(PostedStatus {
            id: sent.len().to_string(),
            url: Some(format!("https://social.example/@feed/{}", sent.len())),
        })
    }
}

pub fn poster(publisher: FakePublisher) -> Poster<FakePublisher> {
    Poster::new(publisher, Visibility::Unlisted, None)
}

/// Write `template` into `dir` and point a post config at it.
pub fn post_config(dir: &TempDir, template: &str) -> PostConfig {
    let path = dir.path().join("post-template.txt");
    std::fs::write(&path, template).unwrap();
    PostConfig {
        template_path: path.to_string_lossy().into_owned(),
        ..PostConfig::default()
    }
}

/// Feed with one item per guid, titled "Item <guid>".
pub fn feed_of(guids: &[&str]) -> Feed {
    Feed {
        title: "Synthetic".to_string(),
        link: "https://example.com/".to_string(),
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
