//! Stable entry identifiers.
//!
//! The same logical feed item must map to the same id on every fetch, which
//! is what makes saving an entry idempotent.

use sha2::{Digest, Sha256};

use crate::feed::types::FeedItem;

/// Derive the entry id for a feed item.
///
/// A non-empty feed-supplied GUID is used verbatim. Otherwise the id is the
/// lowercase hex SHA-256 of title, link and publication date concatenated,
/// where the date is the textual form if present, then the parsed value in
/// RFC 3339, then empty. Items from `parse_feed` hold RFC 3339 text, so ids
/// for guid-less feed entries hash over that rather than the raw pubDate.
pub fn entry_id(item: &FeedItem) -> String {
    if !item.guid.is_empty() {
        return item.guid.clone();
    }

    let published = match (&item.published, &item.published_at) {
        (Some(raw), _) if !raw.is_empty() => raw.clone(),
        (_, Some(dt)) => dt.to_rfc3339(),
        _ => String::new(),
    };

    let mut hasher = Sha256::new();
    hasher.update(item.title.as_bytes());
    hasher.update(item.link.as_bytes());
    hasher.update(published.as_bytes());
    format!("{:x}", hasher.finalize())
}
