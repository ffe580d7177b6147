//! Template engine module for feed-to-mastodon.
//!
//! Provides a Handlebars-style template engine for rendering posts.
//!
//! # Features
//!
//! - Variable expansion: `{{variable}}` and `{{item.title}}`
//! - Conditionals: `{{#if condition}}...{{else}}...{{/if}}`, `{{#unless}}`
//! - Loops: `{{#each items}}...{{/each}}`
//! - Scoping: `{{#with object}}...{{/with}}`
//! - Helpers: `{{truncate path 100}}` and `{{text path}}`
//! - Escaping: `\{{` to output literal `{{`
//!
//! # Example
//!
//! ```
//! use feed_to_mastodon::template::{render_str, TemplateContext, Value};
//!
//! let mut context = TemplateContext::new();
//! context.set("name", Value::String("World".to_string()));
//!
//! let result = render_str("Hello, {{name}}!", &context).unwrap();
//! assert_eq!(result, "Hello, World!");
//! ```

mod filters;
mod parser;
mod post;
mod renderer;

use std::collections::HashMap;

use thiserror::Error;

pub use filters::{strip_html, truncate_chars};
pub use parser::{Node, Parser};
pub use post::{PostRenderer, DEFAULT_TEMPLATE};
pub use renderer::Renderer;

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template file could not be read.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Render error.
    #[error("Render error: {0}")]
    Render(String),

    /// Entry data could not be decoded into a feed item.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// A value that can be used in templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A list of values.
    List(Vec<Value>),
    /// An object (key-value pairs).
    Object(HashMap<String, Value>),
    /// A null/empty value.
    Null,
}

impl Value {
    /// Convert the value to a string for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(_) => "[object]".to_string(),
            Value::Null => "".to_string(),
        }
    }

    /// Check if the value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        }
    }

    /// Get a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::List(list) => {
                    let index: usize = part.parse().ok()?;
                    current = list.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Context for template rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Variables available in the template.
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create an empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable in the context.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable from the context.
    pub fn get(&self, name: &str) -> Option<&Value> {
        // First try direct lookup
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }

        // Try dot-notation path lookup
        if let Some((root, rest)) = name.split_once('.') {
            if let Some(root) = self.variables.get(root) {
                return root.get_path(rest);
            }
        }

        None
    }

    /// Create a child context.
    ///
    /// The child context inherits all variables from the parent.
    pub fn child(&self) -> Self {
        self.clone()
    }
}

/// Parse and render a template string in one step.
pub fn render_str(template: &str, context: &TemplateContext) -> Result<String> {
    let nodes = Parser::new(template).parse()?;
    Renderer::new(context).render(&nodes)
}
