//! JSON shapes exchanged with callers.
//!
//! # Invariants
//! - Field names are camelCase; outcomes are `correct` / `incorrect`.
//! - Timestamps are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wordbook_core::{ReviewOutcome, ReviewRecord, Word, WordBook};

/// One outcome submitted by a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub word_id: Uuid,
    pub result: ReviewOutcome,
}

/// Word as presented to a study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueWordView {
    pub id: Uuid,
    pub term: String,
    pub meaning: String,
    pub consecutive_correct_count: u32,
    pub next_review_date: i64,
}

impl From<&Word> for DueWordView {
    fn from(word: &Word) -> Self {
        Self {
            id: word.id,
            term: word.term.clone(),
            meaning: word.meaning.clone(),
            consecutive_correct_count: word.review.consecutive_correct_count,
            next_review_date: word.review.next_review_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordBookView {
    pub id: Uuid,
    pub title: String,
    pub created_at: i64,
}

impl From<&WordBook> for WordBookView {
    fn from(book: &WordBook) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            created_at: book.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCountView {
    pub word_book_id: Uuid,
    pub due: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecordView {
    pub word_id: Uuid,
    pub result: ReviewOutcome,
    pub reviewed_at: i64,
    pub consecutive_correct_count: u32,
    pub next_review_date: i64,
}

impl From<&ReviewRecord> for ReviewRecordView {
    fn from(record: &ReviewRecord) -> Self {
        Self {
            word_id: record.word_id,
            result: record.outcome,
            reviewed_at: record.reviewed_at,
            consecutive_correct_count: record.consecutive_correct_count,
            next_review_date: record.next_review_at,
        }
    }
}
