//! Data models for Bookshelf
//!
//! Defines the book record stored in the collection and the normalized
//! metadata returned by the resolver.

use serde::{Deserialize, Deserializer, Serialize};

/// Status given to a new book when the caller doesn't pick one
pub const DEFAULT_STATUS: &str = "wishlist";

/// A tracked book
///
/// Records are kept in a flat, ordered list and persisted as one JSON array.
/// A missing or null `title` or `status` reads back as an empty string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Unique identifier (creation time in milliseconds)
    pub id: i64,
    /// Display title
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Cover image URL
    #[serde(default)]
    pub cover: Option<String>,
    /// Caller-defined bucket ("wishlist", "reading", "read", ...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
}

impl Book {
    /// Create a book from resolved metadata
    ///
    /// An empty or missing status falls back to [`DEFAULT_STATUS`].
    pub fn new(id: i64, metadata: BookMetadata, status: Option<&str>) -> Self {
        let status = match status {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => DEFAULT_STATUS.to_string(),
        };

        Self {
            id,
            title: metadata.title,
            cover: metadata.cover,
            status,
        }
    }

    /// Set the status
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Compare the stored id against an identifier taken from a URL path
    ///
    /// The raw value is compared numerically, so `"123"`, `" 123 "` and
    /// `"123.0"` all match id `123`. An empty string compares as zero.
    pub fn matches_id(&self, raw: &str) -> bool {
        match parse_loose_id(raw) {
            Some(n) => self.id as f64 == n,
            None => false,
        }
    }
}

/// Normalized metadata produced by a provider (or the title fallback)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub cover: Option<String>,
}

impl BookMetadata {
    pub fn new(title: impl Into<String>, cover: Option<String>) -> Self {
        Self {
            title: title.into(),
            cover,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_loose_id(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok()
}
