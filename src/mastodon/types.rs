//! Mastodon API types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Who can see a posted status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone and shown in public timelines.
    #[default]
    Public,
    /// Visible to everyone but kept out of public timelines.
    Unlisted,
    /// Followers only.
    Private,
    /// Mentioned users only.
    Direct,
}

impl Visibility {
    /// API name of the visibility.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            "direct" => Ok(Visibility::Direct),
            other => Err(AppError::Validation(format!(
                "invalid visibility: {other} (must be public, unlisted, private, or direct)"
            ))),
        }
    }
}

/// Body of a status creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStatus {
    pub status: String,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoiler_text: Option<String>,
}

/// The created status, as returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostedStatus {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Token returned by the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}
