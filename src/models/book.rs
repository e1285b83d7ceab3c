//! Book (catalogue record) model and related types

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Caller-assigned book identifier, immutable after creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        BookId(s.to_string())
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        BookId(s)
    }
}

/// Catalogue record, also the persisted shape of a book.
///
/// `borrowed <= total` and `total > 0` hold for every record reachable
/// through the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u32>,
    pub total: u32,
    #[serde(default)]
    pub borrowed: u32,
}

impl Book {
    /// Copies currently on the shelf
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.borrowed)
    }

    /// Case-insensitive substring match against title and author.
    /// `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
    }
}

/// Book with derived availability, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub author_id: Option<u32>,
    pub total: u32,
    pub borrowed: u32,
    pub available: u32,
}

impl From<&Book> for BookDetails {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            author_id: book.author_id,
            total: book.total,
            borrowed: book.borrowed,
            available: book.available(),
        }
    }
}

/// Add (or merge copies into) a catalogue record
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddBook {
    /// Caller-assigned identifier
    #[validate(length(min = 1, message = "book id must not be empty"))]
    pub id: String,
    /// Title, required when the book is new
    #[serde(default)]
    pub title: String,
    /// Author name; ignored when `author_id` is set
    #[serde(default)]
    pub author: String,
    /// Link to a registered author
    pub author_id: Option<u32>,
    /// Number of copies to add
    pub copies: u32,
}
