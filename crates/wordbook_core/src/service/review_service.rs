//! Review scheduling use-cases.
//!
//! # Responsibility
//! - Fetch the due words of a word book for a study session.
//! - Record one review outcome: load, apply policy, persist.
//!
//! # Invariants
//! - "Now" is read from the clock once per call; nothing is precomputed.
//! - `NotFound` is reported before any write happens.
//! - Persistence failures are returned unchanged and never retried.
//! - Recording the same outcome twice advances the state twice.

use crate::clock::{Clock, SystemClock};
use crate::model::review::ReviewOutcome;
use crate::model::word::{Word, WordId};
use crate::model::word_book::WordBookId;
use crate::repo::word_repo::{DueWordQuery, ReviewRecord, ReviewStateUpdate, WordRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for review use-cases.
#[derive(Debug)]
pub enum ReviewServiceError {
    /// Target word does not exist (or was deleted concurrently).
    NotFound(WordId),
    /// Persisted review state is corrupted (e.g. negative streak).
    InvalidState(String),
    /// Another update for the same word landed between read and write.
    Conflict(WordId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ReviewServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "word not found: {id}"),
            Self::InvalidState(details) => write!(f, "invalid review state: {details}"),
            Self::Conflict(id) => write!(f, "word {id} was updated concurrently; reload and retry"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReviewServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ReviewServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Conflict(id) => Self::Conflict(id),
            RepoError::Validation(err) => Self::InvalidState(err.to_string()),
            RepoError::InvalidData(message) => Self::InvalidState(message),
            other => Self::Repo(other),
        }
    }
}

pub type ReviewResult<T> = Result<T, ReviewServiceError>;

/// Review scheduler facade over a word repository.
pub struct ReviewService<R: WordRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: WordRepository> ReviewService<R> {
    /// Creates a service evaluating "now" against wall-clock time.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: WordRepository, C: Clock> ReviewService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Returns every due word of a book in unpredictable order.
    pub fn due_words(&self, word_book_id: WordBookId) -> ReviewResult<Vec<Word>> {
        self.due_words_with_rng(word_book_id, &mut rand::thread_rng())
    }

    /// Returns every due word of a book, shuffled with the provided RNG.
    pub fn due_words_with_rng<G: Rng + ?Sized>(
        &self,
        word_book_id: WordBookId,
        rng: &mut G,
    ) -> ReviewResult<Vec<Word>> {
        let query = DueWordQuery::new(word_book_id, self.clock.now_ms());
        let mut words = self.repo.find_due_words(&query)?;
        shuffle_words(&mut words, rng);
        Ok(words)
    }

    /// Returns at most `limit` due words in insertion order.
    ///
    /// Not shuffled, so consecutive pages are deterministic.
    pub fn due_words_page(&self, word_book_id: WordBookId, limit: u32) -> ReviewResult<Vec<Word>> {
        let query = DueWordQuery::new(word_book_id, self.clock.now_ms()).with_limit(limit);
        Ok(self.repo.find_due_words(&query)?)
    }

    /// Counts due words of a book.
    pub fn count_due_words(&self, word_book_id: WordBookId) -> ReviewResult<u64> {
        Ok(self
            .repo
            .count_due_words(word_book_id, self.clock.now_ms())?)
    }

    /// Records one outcome and returns the updated word.
    ///
    /// # Errors
    /// - `NotFound` when the word does not exist; nothing is written.
    /// - `Conflict` when a concurrent update changed the word after loading.
    /// - `InvalidState` when the stored review state is corrupted.
    pub fn record_outcome(&self, word_id: WordId, outcome: ReviewOutcome) -> ReviewResult<Word> {
        let Some(current) = self.repo.get_word(word_id)? else {
            warn!(
                "event=review_record module=review status=error error_code=word_not_found word_id={}",
                word_id
            );
            return Err(ReviewServiceError::NotFound(word_id));
        };

        let now_ms = self.clock.now_ms();
        let updated = current.apply_outcome(outcome, now_ms);
        let update = ReviewStateUpdate {
            word_id,
            expected: current.review,
            next: updated.review,
            outcome,
            reviewed_at: now_ms,
        };

        if let Err(err) = self.repo.update_review_state(&update) {
            warn!(
                "event=review_record module=review status=error word_id={} outcome={} error={}",
                word_id, outcome, err
            );
            return Err(err.into());
        }

        info!(
            "event=review_record module=review status=ok word_id={} outcome={} streak={} next_review_at={}",
            word_id,
            outcome,
            updated.review.consecutive_correct_count,
            updated.review.next_review_at
        );
        Ok(updated)
    }

    /// Records an outcome given as a correct/incorrect flag.
    pub fn record_answer(&self, word_id: WordId, is_correct: bool) -> ReviewResult<Word> {
        self.record_outcome(word_id, ReviewOutcome::from_is_correct(is_correct))
    }

    /// Lists the review history of one word, newest first.
    pub fn review_history(&self, word_id: WordId) -> ReviewResult<Vec<ReviewRecord>> {
        if self.repo.get_word(word_id)?.is_none() {
            return Err(ReviewServiceError::NotFound(word_id));
        }
        Ok(self.repo.list_review_records(word_id)?)
    }
}

/// Applies an unbiased Fisher-Yates permutation to a due list.
pub fn shuffle_words<G: Rng + ?Sized>(words: &mut [Word], rng: &mut G) {
    words.shuffle(rng);
}
