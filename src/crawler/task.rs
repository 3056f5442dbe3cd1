use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::crawler::error::CrawlError;

/// The kind of page a task points at, which decides how it is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A page listing links to articles
    Listing,
    /// A single article page
    Article,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Listing => "LISTING",
            Role::Article => "ARTICLE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CrawlError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_uppercase().as_str() {
            "LISTING" => Ok(Role::Listing),
            "ARTICLE" => Ok(Role::Article),
            _ => Err(CrawlError::UnknownRole(label.to_string())),
        }
    }
}

/// A single page visit waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// URL to fetch
    pub url: String,

    /// How the fetched page is handled
    pub role: Role,

    /// Dedup identity; derived from `url` unless assigned explicitly
    pub unique_key: String,
}

impl Task {
    /// Create a task whose unique key is derived from its URL
    pub fn new(url: impl Into<String>, role: Role) -> Self {
        let url = url.into();
        let unique_key = unique_key_for(&url);
        Self {
            url,
            role,
            unique_key,
        }
    }

    pub fn listing(url: impl Into<String>) -> Self {
        Self::new(url, Role::Listing)
    }

    pub fn article(url: impl Into<String>) -> Self {
        Self::new(url, Role::Article)
    }

    /// Replace the derived unique key with an explicit one
    pub fn with_unique_key(mut self, unique_key: impl Into<String>) -> Self {
        self.unique_key = unique_key.into();
        self
    }
}

/// Title and body harvested from one article page
///
/// Only constructed when at least one of the two fields carries text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    source_url: String,
    title: Option<String>,
    body_text: Option<String>,
}

impl ExtractedRecord {
    /// Build a record, or `None` when both title and body are empty
    pub fn new(
        source_url: impl Into<String>,
        title: Option<String>,
        body_text: Option<String>,
    ) -> Option<Self> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let body_text = body_text
            .map(|b| b.trim_end().to_string())
            .filter(|b| !b.is_empty());

        if title.is_none() && body_text.is_none() {
            return None;
        }

        Some(Self {
            source_url: source_url.into(),
            title,
            body_text,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn body_text(&self) -> Option<&str> {
        self.body_text.as_deref()
    }
}

/// Derive the dedup key for a URL
///
/// Lower-cases scheme and host, drops default ports and fragments, sorts query
/// parameters by key and removes the trailing slash of a bare root path.
/// Strings that do not parse as URLs are used verbatim (trimmed).
pub fn unique_key_for(url: &str) -> String {
    let trimmed = url.trim();
    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return trimmed.to_string(),
    };

    parsed.set_fragment(None);

    if parsed.query().is_some() {
        let mut params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        if params.is_empty() {
            parsed.set_query(None);
        } else {
            params.sort_by(|a, b| a.0.cmp(&b.0));
            parsed.query_pairs_mut().clear().extend_pairs(params.iter());
        }
    }

    let mut key = parsed.to_string();
    if parsed.path() == "/" && parsed.query().is_none() && key.ends_with('/') {
        key.pop();
    }
    key
}
