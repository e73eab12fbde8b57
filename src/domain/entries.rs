//! Entries read from the content database.

use serde::{Deserialize, Serialize};

/// Title used whenever an entry has no readable title.
pub const UNTITLED: &str = "Untitled";

/// Listing-facing metadata for one entry; serialised as an item of the JSON listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub tags: Vec<String>,
}

impl Default for EntryMetadata {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
            slug: String::new(),
            date: String::new(),
            tags: Vec::new(),
        }
    }
}

/// One database entry after metadata extraction. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub date: String,
    pub tags: Vec<String>,
    pub published: bool,
    /// Creation timestamp as reported by the source (RFC 3339); empty when absent.
    pub created_time: String,
}

impl SourceEntry {
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            title: self.title.clone(),
            slug: self.slug.clone(),
            date: self.date.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Ordering key used to break ties between entries sharing a slug.
    /// Entries without a creation time sort after every dated entry.
    pub(crate) fn creation_key(&self) -> (bool, &str, &str) {
        (
            self.created_time.is_empty(),
            self.created_time.as_str(),
            self.id.as_str(),
        )
    }
}
