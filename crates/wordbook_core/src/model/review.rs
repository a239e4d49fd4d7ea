//! Review state carried by every word.
//!
//! # Responsibility
//! - Hold the two scheduling fields: streak and next-eligible review instant.
//! - Reject corrupted persisted values instead of clamping them.
//!
//! # Invariants
//! - `consecutive_correct_count` is never negative (enforced by `u32`).
//! - `next_review_at` is always defined once a word exists.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::word::WordValidationError;

/// Outcome of one review attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// The user recalled the meaning.
    Correct,
    /// The user failed to recall the meaning.
    Incorrect,
}

impl ReviewOutcome {
    /// Maps a boolean answer flag onto an outcome.
    pub fn from_is_correct(is_correct: bool) -> Self {
        if is_correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }

    /// Stable storage/wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }

    /// Parses a storage/wire label.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "correct" => Some(Self::Correct),
            "incorrect" => Some(Self::Incorrect),
            _ => None,
        }
    }
}

impl Display for ReviewOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-word scheduling fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Number of consecutive correct outcomes since the last incorrect one.
    pub consecutive_correct_count: u32,
    /// Unix epoch milliseconds. Earliest instant the word may be presented.
    pub next_review_at: i64,
}

impl ReviewState {
    /// State of a freshly created word: no streak, due at `now_ms`.
    pub fn initial(now_ms: i64) -> Self {
        Self {
            consecutive_correct_count: 0,
            next_review_at: now_ms,
        }
    }

    /// Rebuilds state from raw persisted columns.
    ///
    /// # Errors
    /// - Returns `NegativeStreak` when storage holds a negative count.
    /// - Returns `StreakOutOfRange` when the count does not fit `u32`.
    pub fn from_persisted(
        consecutive_correct_count: i64,
        next_review_at: i64,
    ) -> Result<Self, WordValidationError> {
        if consecutive_correct_count < 0 {
            return Err(WordValidationError::NegativeStreak(
                consecutive_correct_count,
            ));
        }
        let consecutive_correct_count = u32::try_from(consecutive_correct_count)
            .map_err(|_| WordValidationError::StreakOutOfRange(consecutive_correct_count))?;

        Ok(Self {
            consecutive_correct_count,
            next_review_at,
        })
    }
}
