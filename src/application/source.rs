//! The content-source seam: queries over the entry database and block listings.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Conjunctive filter over entries. `None` fields are not constrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub slug: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySort {
    /// Newest publication date first.
    DateDescending,
    /// Oldest creation time first.
    CreatedAscending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub filter: EntryFilter,
    pub sort: Option<EntrySort>,
}

impl EntryQuery {
    /// Every published entry, newest first.
    pub fn published() -> Self {
        Self {
            filter: EntryFilter {
                slug: None,
                published: Some(true),
            },
            sort: Some(EntrySort::DateDescending),
        }
    }

    /// Published entries carrying `slug`, oldest creation first.
    pub fn published_with_slug(slug: impl Into<String>) -> Self {
        Self {
            filter: EntryFilter {
                slug: Some(slug.into()),
                published: Some(true),
            },
            sort: Some(EntrySort::CreatedAscending),
        }
    }
}

/// First page of an entry's block children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPage {
    pub blocks: Vec<Value>,
    /// Whether the source reported further pages. They are never requested.
    pub has_more: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("request to content source failed: {0}")]
    Transport(String),
    #[error("content source responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("content source returned an unreadable body: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// The underlying message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            SourceError::Transport(message)
            | SourceError::Status { message, .. }
            | SourceError::Decode(message) => message,
        }
    }
}

/// Remote structured-content source. Implementations perform exactly one
/// round trip per call and never retry.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Raw entry records matching `query`, in the order the source returns them.
    async fn query_entries(&self, query: &EntryQuery) -> Result<Vec<Value>, SourceError>;

    /// The first page of block children of `entry_id`, at most `page_size` items.
    async fn list_blocks(&self, entry_id: &str, page_size: u32) -> Result<BlockPage, SourceError>;
}
