//! Word repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `words` plus the due-word query used by study sessions.
//! - Persist review transitions together with their review record.
//!
//! # Invariants
//! - Due selection: same book, (`next_review_at <= now` or never reviewed),
//!   and streak below `MASTERY_THRESHOLD`.
//! - Due rows come back in insertion order (`seq ASC`) before any limit.
//! - Review writes are conditional on the previously read state.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::review::{ReviewOutcome, ReviewState};
use crate::model::word::{Word, WordId};
use crate::model::word_book::WordBookId;
use crate::schedule::policy::MASTERY_THRESHOLD;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

const WORD_SELECT_SQL: &str = "SELECT
    id,
    word_book_id,
    term,
    meaning,
    created_at,
    consecutive_correct_count,
    next_review_at,
    last_reviewed_at
FROM words";

const DUE_PREDICATE_SQL: &str = "word_book_id = ?1
    AND (next_review_at <= ?2 OR last_reviewed_at IS NULL)
    AND consecutive_correct_count < ?3";

const WORD_COLUMNS: &[&str] = &[
    "seq",
    "id",
    "word_book_id",
    "term",
    "meaning",
    "created_at",
    "consecutive_correct_count",
    "next_review_at",
    "last_reviewed_at",
];

const REVIEW_RECORD_COLUMNS: &[&str] = &[
    "id",
    "word_id",
    "outcome",
    "reviewed_at",
    "consecutive_correct_count",
    "next_review_at",
];

/// Selection of due words for one word book at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWordQuery {
    pub word_book_id: WordBookId,
    /// Unix epoch milliseconds the due predicate is evaluated against.
    pub now_ms: i64,
    /// Applied after insertion-order sorting. `None` returns every due word.
    pub limit: Option<u32>,
}

impl DueWordQuery {
    pub fn new(word_book_id: WordBookId, now_ms: i64) -> Self {
        Self {
            word_book_id,
            now_ms,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Conditional review-state write for one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewStateUpdate {
    pub word_id: WordId,
    /// State observed when the word was loaded.
    pub expected: ReviewState,
    /// State computed by the scheduling policy.
    pub next: ReviewState,
    pub outcome: ReviewOutcome,
    pub reviewed_at: i64,
}

/// One appended review history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub word_id: WordId,
    pub outcome: ReviewOutcome,
    pub reviewed_at: i64,
    /// Streak after this outcome.
    pub consecutive_correct_count: u32,
    /// Due instant after this outcome.
    pub next_review_at: i64,
}

/// Persistence contract used by the review scheduler and word services.
pub trait WordRepository {
    fn create_word(&self, word: &Word) -> RepoResult<WordId>;
    fn get_word(&self, id: WordId) -> RepoResult<Option<Word>>;
    /// Lists all words of a book in insertion order.
    fn list_words(&self, word_book_id: WordBookId) -> RepoResult<Vec<Word>>;
    /// Replaces `term` and `meaning` only; review state is untouched.
    fn update_word_content(&self, word: &Word) -> RepoResult<()>;
    fn delete_word(&self, id: WordId) -> RepoResult<()>;
    /// Returns due words in insertion order, honoring `query.limit`.
    fn find_due_words(&self, query: &DueWordQuery) -> RepoResult<Vec<Word>>;
    /// Counts due words without materializing rows.
    fn count_due_words(&self, word_book_id: WordBookId, now_ms: i64) -> RepoResult<u64>;
    /// Writes `update.next` only if the stored state still equals
    /// `update.expected`, and appends a review record in the same transaction.
    ///
    /// # Errors
    /// - `NotFound` when the word does not exist.
    /// - `Conflict` when the stored state changed since it was read.
    fn update_review_state(&self, update: &ReviewStateUpdate) -> RepoResult<()>;
    /// Lists review history for one word, newest first.
    fn list_review_records(&self, word_id: WordId) -> RepoResult<Vec<ReviewRecord>>;
}

/// SQLite-backed word repository.
pub struct SqliteWordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("words", WORD_COLUMNS),
                ("review_records", REVIEW_RECORD_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl WordRepository for SqliteWordRepository<'_> {
    fn create_word(&self, word: &Word) -> RepoResult<WordId> {
        word.validate()?;

        self.conn.execute(
            "INSERT INTO words (
                id,
                word_book_id,
                term,
                meaning,
                created_at,
                consecutive_correct_count,
                next_review_at,
                last_reviewed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                word.id.to_string(),
                word.word_book_id.to_string(),
                word.term.as_str(),
                word.meaning.as_str(),
                word.created_at,
                i64::from(word.review.consecutive_correct_count),
                word.review.next_review_at,
                word.last_reviewed_at,
            ],
        )?;

        Ok(word.id)
    }

    fn get_word(&self, id: WordId) -> RepoResult<Option<Word>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORD_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_word_row(row)?));
        }
        Ok(None)
    }

    fn list_words(&self, word_book_id: WordBookId) -> RepoResult<Vec<Word>> {
        let mut stmt = self.conn.prepare(&format!(
            "{WORD_SELECT_SQL} WHERE word_book_id = ?1 ORDER BY seq ASC;"
        ))?;
        let mut rows = stmt.query([word_book_id.to_string()])?;
        collect_words(&mut rows)
    }

    fn update_word_content(&self, word: &Word) -> RepoResult<()> {
        word.validate()?;

        let changed = self.conn.execute(
            "UPDATE words SET term = ?2, meaning = ?3 WHERE id = ?1;",
            params![word.id.to_string(), word.term.as_str(), word.meaning.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(word.id));
        }
        Ok(())
    }

    fn delete_word(&self, id: WordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM words WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_due_words(&self, query: &DueWordQuery) -> RepoResult<Vec<Word>> {
        // LIMIT -1 is SQLite for "no limit".
        let limit = query.limit.map_or(-1, i64::from);
        let mut stmt = self.conn.prepare(&format!(
            "{WORD_SELECT_SQL}
             WHERE {DUE_PREDICATE_SQL}
             ORDER BY seq ASC
             LIMIT ?4;"
        ))?;
        let mut rows = stmt.query(params![
            query.word_book_id.to_string(),
            query.now_ms,
            i64::from(MASTERY_THRESHOLD),
            limit,
        ])?;
        collect_words(&mut rows)
    }

    fn count_due_words(&self, word_book_id: WordBookId, now_ms: i64) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM words WHERE {DUE_PREDICATE_SQL};"),
            params![
                word_book_id.to_string(),
                now_ms,
                i64::from(MASTERY_THRESHOLD)
            ],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative due word count `{count}`")))
    }

    fn update_review_state(&self, update: &ReviewStateUpdate) -> RepoResult<()> {
        let word_id = update.word_id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let changed = tx.execute(
            "UPDATE words
             SET
                consecutive_correct_count = ?2,
                next_review_at = ?3,
                last_reviewed_at = ?4
             WHERE id = ?1
               AND consecutive_correct_count = ?5
               AND next_review_at = ?6;",
            params![
                word_id.as_str(),
                i64::from(update.next.consecutive_correct_count),
                update.next.next_review_at,
                update.reviewed_at,
                i64::from(update.expected.consecutive_correct_count),
                update.expected.next_review_at,
            ],
        )?;

        if changed == 0 {
            return Err(if word_exists(&tx, word_id.as_str())? {
                RepoError::Conflict(update.word_id)
            } else {
                RepoError::NotFound(update.word_id)
            });
        }

        tx.execute(
            "INSERT INTO review_records (
                word_id,
                outcome,
                reviewed_at,
                consecutive_correct_count,
                next_review_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                word_id.as_str(),
                update.outcome.as_str(),
                update.reviewed_at,
                i64::from(update.next.consecutive_correct_count),
                update.next.next_review_at,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_review_records(&self, word_id: WordId) -> RepoResult<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                word_id,
                outcome,
                reviewed_at,
                consecutive_correct_count,
                next_review_at
             FROM review_records
             WHERE word_id = ?1
             ORDER BY reviewed_at DESC, id DESC;",
        )?;
        let mut rows = stmt.query([word_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_review_record_row(row)?);
        }
        Ok(records)
    }
}

fn word_exists(conn: &Connection, word_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM words WHERE id = ?1);",
        [word_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn collect_words(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Word>> {
    let mut words = Vec::new();
    while let Some(row) = rows.next()? {
        words.push(parse_word_row(row)?);
    }
    Ok(words)
}

fn parse_word_row(row: &Row<'_>) -> RepoResult<Word> {
    let id_text: String = row.get("id")?;
    let book_text: String = row.get("word_book_id")?;
    let review = ReviewState::from_persisted(
        row.get("consecutive_correct_count")?,
        row.get("next_review_at")?,
    )?;

    let word = Word {
        id: parse_uuid(&id_text, "words.id")?,
        word_book_id: parse_uuid(&book_text, "words.word_book_id")?,
        term: row.get("term")?,
        meaning: row.get("meaning")?,
        created_at: row.get("created_at")?,
        review,
        last_reviewed_at: row.get("last_reviewed_at")?,
    };
    word.validate()?;
    Ok(word)
}

fn parse_review_record_row(row: &Row<'_>) -> RepoResult<ReviewRecord> {
    let word_id_text: String = row.get("word_id")?;
    let outcome_text: String = row.get("outcome")?;
    let outcome = ReviewOutcome::parse(&outcome_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid outcome `{outcome_text}` in review_records.outcome"
        ))
    })?;
    let state = ReviewState::from_persisted(
        row.get("consecutive_correct_count")?,
        row.get("next_review_at")?,
    )?;

    Ok(ReviewRecord {
        id: row.get("id")?,
        word_id: parse_uuid(&word_id_text, "review_records.word_id")?,
        outcome,
        reviewed_at: row.get("reviewed_at")?,
        consecutive_correct_count: state.consecutive_correct_count,
        next_review_at: state.next_review_at,
    })
}
