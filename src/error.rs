//! Error types for feed-to-mastodon.

use thiserror::Error;

/// Common error type for feed-to-mastodon.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database error.
    ///
    /// Covers I/O failure, corruption and migration failure against the
    /// backing file. Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Feed could not be fetched or parsed.
    #[error("feed error: {0}")]
    Fetch(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// Posting to the remote API failed.
    #[error("post error: {0}")]
    Dispatch(String),

    /// Validation error for configuration or user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Whether this is the recoverable "row does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

/// Result type alias for feed-to-mastodon operations.
pub type Result<T> = std::result::Result<T, AppError>;
