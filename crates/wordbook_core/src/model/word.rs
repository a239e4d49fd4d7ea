//! Word aggregate.
//!
//! # Responsibility
//! - Own identity, content and review state of one vocabulary entry.
//! - Apply scheduling outcomes as pure snapshot transitions.
//!
//! # Invariants
//! - `id`, `word_book_id` and `created_at` never change after creation.
//! - `term` and `meaning` are non-empty after trimming.
//! - Review state changes only through `schedule::policy`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::review::{ReviewOutcome, ReviewState};
use super::word_book::WordBookId;
use crate::schedule::policy;

/// Stable identifier of a word.
pub type WordId = Uuid;

/// Maximum term length, counted in characters.
pub const TERM_MAX_CHARS: usize = 255;
/// Maximum word book title length, counted in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Validation failures for word and word book content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordValidationError {
    EmptyTerm,
    TermTooLong { max: usize, actual: usize },
    EmptyMeaning,
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    /// Storage held a negative streak; never clamped.
    NegativeStreak(i64),
    StreakOutOfRange(i64),
}

impl Display for WordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTerm => write!(f, "term cannot be empty"),
            Self::TermTooLong { max, actual } => {
                write!(f, "term is {actual} characters long; maximum is {max}")
            }
            Self::EmptyMeaning => write!(f, "meaning cannot be empty"),
            Self::EmptyTitle => write!(f, "word book title cannot be empty"),
            Self::TitleTooLong { max, actual } => write!(
                f,
                "word book title is {actual} characters long; maximum is {max}"
            ),
            Self::NegativeStreak(value) => {
                write!(f, "consecutive correct count must not be negative, got {value}")
            }
            Self::StreakOutOfRange(value) => {
                write!(f, "consecutive correct count {value} is out of range")
            }
        }
    }
}

impl Error for WordValidationError {}

/// One vocabulary entry and its review schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    /// Owning word book. Referenced, not composed.
    pub word_book_id: WordBookId,
    pub term: String,
    pub meaning: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub review: ReviewState,
    /// Unix epoch milliseconds of the last recorded outcome. `None` until the
    /// first review.
    pub last_reviewed_at: Option<i64>,
}

impl Word {
    /// Creates a new word that is due immediately.
    ///
    /// # Invariants
    /// - `consecutive_correct_count` starts at 0.
    /// - `next_review_at` starts at `now_ms`.
    ///
    /// # Errors
    /// - Returns a validation error for blank or over-long content.
    pub fn create(
        word_book_id: WordBookId,
        term: &str,
        meaning: &str,
        now_ms: i64,
    ) -> Result<Self, WordValidationError> {
        Self::with_id(Uuid::new_v4(), word_book_id, term, meaning, now_ms)
    }

    /// Creates a new word with a caller-provided stable ID.
    pub fn with_id(
        id: WordId,
        word_book_id: WordBookId,
        term: &str,
        meaning: &str,
        now_ms: i64,
    ) -> Result<Self, WordValidationError> {
        let word = Self {
            id,
            word_book_id,
            term: normalize_term(term)?,
            meaning: normalize_meaning(meaning)?,
            created_at: now_ms,
            review: ReviewState::initial(now_ms),
            last_reviewed_at: None,
        };
        Ok(word)
    }

    /// Returns a new snapshot with the outcome applied at `now_ms`.
    ///
    /// Identity and content are carried over unchanged.
    pub fn apply_outcome(&self, outcome: ReviewOutcome, now_ms: i64) -> Self {
        Self {
            review: policy::next_review_state(self.review, outcome, now_ms),
            last_reviewed_at: Some(now_ms),
            ..self.clone()
        }
    }

    /// Returns a new snapshot with replaced content; review state is kept.
    pub fn with_content(&self, term: &str, meaning: &str) -> Result<Self, WordValidationError> {
        Ok(Self {
            term: normalize_term(term)?,
            meaning: normalize_meaning(meaning)?,
            ..self.clone()
        })
    }

    pub fn is_mastered(&self) -> bool {
        policy::is_mastered(self.review.consecutive_correct_count)
    }

    /// Returns whether this word belongs in a study session at `now_ms`.
    pub fn is_due(&self, now_ms: i64) -> bool {
        policy::is_due(self.review, self.last_reviewed_at.is_none(), now_ms)
    }

    /// Validates content invariants before persistence.
    pub fn validate(&self) -> Result<(), WordValidationError> {
        normalize_term(&self.term)?;
        normalize_meaning(&self.meaning)?;
        Ok(())
    }
}

/// Trims and validates a term.
pub fn normalize_term(term: &str) -> Result<String, WordValidationError> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(WordValidationError::EmptyTerm);
    }
    let actual = trimmed.chars().count();
    if actual > TERM_MAX_CHARS {
        return Err(WordValidationError::TermTooLong {
            max: TERM_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Trims and validates a meaning.
pub fn normalize_meaning(meaning: &str) -> Result<String, WordValidationError> {
    let trimmed = meaning.trim();
    if trimmed.is_empty() {
        return Err(WordValidationError::EmptyMeaning);
    }
    Ok(trimmed.to_string())
}
