//! Word book model.
//!
//! # Responsibility
//! - Group words under a titled collection.
//!
//! # Invariants
//! - Words reference their book by ID; deleting a book deletes its words.
//! - `title` is 1..=255 characters after trimming.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::word::{WordValidationError, TITLE_MAX_CHARS};

/// Stable identifier of a word book.
pub type WordBookId = Uuid;

/// Titled collection of words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBook {
    pub id: WordBookId,
    pub title: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl WordBook {
    /// Creates a word book with a generated ID.
    pub fn create(title: &str, now_ms: i64) -> Result<Self, WordValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_title(title)?,
            created_at: now_ms,
        })
    }
}

/// Trims and validates a word book title.
pub fn normalize_title(title: &str) -> Result<String, WordValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(WordValidationError::EmptyTitle);
    }
    let actual = trimmed.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(WordValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}
