//! Rendering stored entries into post text.

use std::path::Path;

use tracing::warn;

use super::parser::{Node, Parser};
use super::renderer::Renderer;
use super::{Result, TemplateContext, TemplateError, Value};
use crate::feed::{FeedItem, FeedMetadata};

/// Template written by `init` and used when no template file exists.
pub const DEFAULT_TEMPLATE: &str = "{{item.title}}\n{{item.link}}";

/// Renders entry data through a parsed post template.
///
/// Templates see the decoded feed item as `item` and the last fetched feed's
/// metadata as `feed`.
#[derive(Debug, Clone)]
pub struct PostRenderer {
    nodes: Vec<Node>,
    character_limit: usize,
    feed: Value,
}

impl PostRenderer {
    /// Parse a template. A `character_limit` of 0 disables the length check.
    pub fn new(template: &str, character_limit: usize) -> Result<Self> {
        let nodes = Parser::new(template).parse()?;
        Ok(Self {
            nodes,
            character_limit,
            feed: Value::Null,
        })
    }

    /// Read and parse a template file.
    pub fn from_file(path: impl AsRef<Path>, character_limit: usize) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path)
            .map_err(|e| TemplateError::NotFound(format!("{}: {}", path.display(), e)))?;
        Self::new(&template, character_limit)
    }

    /// Expose feed metadata to templates as `feed`.
    pub fn set_feed(&mut self, metadata: &FeedMetadata) {
        self.feed = serde_json::to_value(metadata)
            .map(Value::from)
            .unwrap_or(Value::Null);
    }

    /// Render one entry's stored data.
    ///
    /// Output over the character limit is logged and returned unchanged.
    pub fn render(&self, entry_data: &[u8]) -> Result<String> {
        let item: FeedItem = serde_json::from_slice(entry_data)
            .map_err(|e| TemplateError::Decode(e.to_string()))?;
        let item = serde_json::to_value(&item).map_err(|e| TemplateError::Decode(e.to_string()))?;

        let mut context = TemplateContext::new();
        context.set("item", Value::from(item));
        context.set("feed", self.feed.clone());

        let text = Renderer::new(&context).render(&self.nodes)?;

        let length = text.chars().count();
        if self.character_limit > 0 && length > self.character_limit {
            warn!(
                length,
                limit = self.character_limit,
                "Rendered post exceeds the character limit"
            );
        }

        Ok(text)
    }
}
