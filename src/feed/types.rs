//! Feed types for feed-to-mastodon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// One item of a fetched feed.
///
/// This is the record serialized into an entry's `entry_data` and exposed to
/// templates as `item`. Unknown fields are ignored on decode so entries
/// written by older versions stay renderable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    /// Identifier supplied by the feed. Empty when the feed has none.
    pub guid: String,
    /// Item title.
    pub title: String,
    /// Link to the item.
    pub link: String,
    /// Summary or description, as published (may contain HTML).
    pub description: String,
    /// Full content, as published (may contain HTML).
    pub content: String,
    /// Name of the first author.
    pub author: String,
    /// Category labels.
    pub categories: Vec<String>,
    /// Publication date as text. Feeds parsed by `parse_feed` carry the
    /// RFC 3339 form of `published_at` here, not the document's raw string.
    pub published: Option<String>,
    /// Parsed publication date.
    pub published_at: Option<DateTime<Utc>>,
    /// Parsed last-updated date.
    pub updated_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Create an item with a title and link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Self::default()
        }
    }

    /// Set the feed-supplied identifier.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the publication date, both as text and parsed.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published = Some(published_at.to_rfc3339());
        self.published_at = Some(published_at);
        self
    }
}

/// Feed-level fields, persisted between runs for templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedMetadata {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

/// A fetched feed snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    /// Feed title.
    pub title: String,
    /// Site URL (the website the feed belongs to).
    pub link: String,
    /// Feed description.
    pub description: String,
    /// Declared language.
    pub language: String,
    /// Items in feed order.
    pub items: Vec<FeedItem>,
}

impl Feed {
    /// Feed-level fields without the items.
    pub fn metadata(&self) -> FeedMetadata {
        FeedMetadata {
            title: self.title.clone(),
            link: self.link.clone(),
            description: self.description.clone(),
            language: self.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_item_builder() {
        let now = Utc::now();
        let item = FeedItem::new("Title", "https://example.com/1")
            .with_guid("guid-1")
            .with_description("Summary")
            .with_published_at(now);

        assert_eq!(item.title, "Title");
        assert_eq!(item.link, "https://example.com/1");
        assert_eq!(item.guid, "guid-1");
        assert_eq!(item.description, "Summary");
        assert_eq!(item.published_at, Some(now));
        assert_eq!(item.published, Some(now.to_rfc3339()));
    }

    #[test]
    fn test_feed_item_decodes_partial_record() {
        let item: FeedItem =
            serde_json::from_str(r#"{"title":"Only title","extra":"ignored"}"#).unwrap();
        assert_eq!(item.title, "Only title");
        assert!(item.link.is_empty());
        assert!(item.categories.is_empty());
        assert!(item.published_at.is_none());
    }

    #[test]
    fn test_feed_metadata() {
        let feed = Feed {
            title: "Blog".to_string(),
            link: "https://example.com".to_string(),
            description: "Posts".to_string(),
            language: "en".to_string(),
            items: vec![FeedItem::new("A", "https://example.com/a")],
        };

        let meta = feed.metadata();
        assert_eq!(meta.title, "Blog");
        assert_eq!(meta.link, "https://example.com");
        assert_eq!(meta.description, "Posts");
        assert_eq!(meta.language, "en");
    }
}
