use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::{params, Connection};
use std::cell::Cell;
use std::collections::HashSet;
use uuid::Uuid;
use wordbook_core::db::open_db_in_memory;
use wordbook_core::{
    Clock, DueWordQuery, FixedClock, RepoError, RepoResult, ReviewOutcome, ReviewRecord, ReviewService,
    ReviewServiceError, ReviewState, ReviewStateUpdate, SqliteWordBookRepository,
    SqliteWordRepository, Word, WordBook, WordBookId, WordBookRepository, WordId, WordRepository,
    DAY_MS, MASTERY_THRESHOLD,
};

const NOW: i64 = 1_760_000_000_000;

fn seed_book(conn: &Connection) -> WordBookId {
    let repo = SqliteWordBookRepository::try_new(conn).unwrap();
    let book = WordBook::create("review", NOW - 30 * DAY_MS).unwrap();
    repo.create_word_book(&book).unwrap()
}

fn seed_word(conn: &Connection, book: WordBookId, term: &str) -> Word {
    let repo = SqliteWordRepository::try_new(conn).unwrap();
    let word = Word::create(book, term, "meaning", NOW - DAY_MS).unwrap();
    repo.create_word(&word).unwrap();
    word
}

/// Delegating repository that counts review writes.
struct CountingRepo<'conn> {
    inner: SqliteWordRepository<'conn>,
    review_writes: Cell<usize>,
}

impl<'conn> CountingRepo<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteWordRepository::try_new(conn).unwrap(),
            review_writes: Cell::new(0),
        }
    }
}

impl WordRepository for CountingRepo<'_> {
    fn create_word(&self, word: &Word) -> RepoResult<WordId> {
        self.inner.create_word(word)
    }
    fn get_word(&self, id: WordId) -> RepoResult<Option<Word>> {
        self.inner.get_word(id)
    }
    fn list_words(&self, word_book_id: WordBookId) -> RepoResult<Vec<Word>> {
        self.inner.list_words(word_book_id)
    }
    fn update_word_content(&self, word: &Word) -> RepoResult<()> {
        self.inner.update_word_content(word)
    }
    fn delete_word(&self, id: WordId) -> RepoResult<()> {
        self.inner.delete_word(id)
    }
    fn find_due_words(&self, query: &DueWordQuery) -> RepoResult<Vec<Word>> {
        self.inner.find_due_words(query)
    }
    fn count_due_words(&self, word_book_id: WordBookId, now_ms: i64) -> RepoResult<u64> {
        self.inner.count_due_words(word_book_id, now_ms)
    }
    fn update_review_state(&self, update: &ReviewStateUpdate) -> RepoResult<()> {
        self.review_writes.set(self.review_writes.get() + 1);
        self.inner.update_review_state(update)
    }
    fn list_review_records(&self, word_id: WordId) -> RepoResult<Vec<ReviewRecord>> {
        self.inner.list_review_records(word_id)
    }
}

/// Repository where another request commits between our read and our write.
struct RacingRepo<'conn> {
    inner: SqliteWordRepository<'conn>,
}

impl WordRepository for RacingRepo<'_> {
    fn create_word(&self, word: &Word) -> RepoResult<WordId> {
        self.inner.create_word(word)
    }
    fn get_word(&self, id: WordId) -> RepoResult<Option<Word>> {
        let loaded = self.inner.get_word(id)?;
        if let Some(word) = &loaded {
            let other = word.apply_outcome(ReviewOutcome::Correct, NOW);
            self.inner.update_review_state(&ReviewStateUpdate {
                word_id: id,
                expected: word.review,
                next: other.review,
                outcome: ReviewOutcome::Correct,
                reviewed_at: NOW,
            })?;
        }
        Ok(loaded)
    }
    fn list_words(&self, word_book_id: WordBookId) -> RepoResult<Vec<Word>> {
        self.inner.list_words(word_book_id)
    }
    fn update_word_content(&self, word: &Word) -> RepoResult<()> {
        self.inner.update_word_content(word)
    }
    fn delete_word(&self, id: WordId) -> RepoResult<()> {
        self.inner.delete_word(id)
    }
    fn find_due_words(&self, query: &DueWordQuery) -> RepoResult<Vec<Word>> {
        self.inner.find_due_words(query)
    }
    fn count_due_words(&self, word_book_id: WordBookId, now_ms: i64) -> RepoResult<u64> {
        self.inner.count_due_words(word_book_id, now_ms)
    }
    fn update_review_state(&self, update: &ReviewStateUpdate) -> RepoResult<()> {
        self.inner.update_review_state(update)
    }
    fn list_review_records(&self, word_id: WordId) -> RepoResult<Vec<ReviewRecord>> {
        self.inner.list_review_records(word_id)
    }
}

#[test]
fn record_correct_from_streak_two_schedules_four_days_out() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "candid");
    conn.execute(
        "UPDATE words
         SET consecutive_correct_count = 2, next_review_at = ?2, last_reviewed_at = ?3
         WHERE id = ?1;",
        params![word.id.to_string(), NOW - DAY_MS, NOW - 3 * DAY_MS],
    )
    .unwrap();

    let repo = SqliteWordRepository::try_new(&conn).unwrap();
    let service = ReviewService::with_clock(repo, FixedClock::new(NOW));

    let updated = service
        .record_outcome(word.id, ReviewOutcome::Correct)
        .unwrap();
    assert_eq!(updated.review.consecutive_correct_count, 3);
    assert_eq!(updated.review.next_review_at, NOW + 4 * DAY_MS);

    let stored = service.repo().get_word(word.id).unwrap().unwrap();
    assert_eq!(stored, updated);
    assert_eq!(stored.term, "candid");
    assert_eq!(stored.last_reviewed_at, Some(NOW));
}

#[test]
fn record_incorrect_resets_to_immediately_due() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "oblique");
    conn.execute(
        "UPDATE words
         SET consecutive_correct_count = 2, next_review_at = ?2, last_reviewed_at = ?3
         WHERE id = ?1;",
        params![word.id.to_string(), NOW - DAY_MS, NOW - 3 * DAY_MS],
    )
    .unwrap();

    let repo = SqliteWordRepository::try_new(&conn).unwrap();
    let service = ReviewService::with_clock(repo, FixedClock::new(NOW));

    let updated = service.record_answer(word.id, false).unwrap();
    assert_eq!(updated.review.consecutive_correct_count, 0);
    assert_eq!(updated.review.next_review_at, NOW);
    assert_eq!(service.count_due_words(book).unwrap(), 1);
}

#[test]
fn streak_of_correct_answers_walks_the_backoff_ladder_to_mastery() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "ladder");

    let clock = FixedClock::new(NOW);
    let repo = SqliteWordRepository::try_new(&conn).unwrap();
    let service = ReviewService::with_clock(repo, &clock);

    let mut previous_due = i64::MIN;
    for k in 1..=MASTERY_THRESHOLD {
        assert_eq!(service.count_due_words(book).unwrap(), 1);
        let updated = service
            .record_outcome(word.id, ReviewOutcome::Correct)
            .unwrap();
        let expected_days = 1i64 << (k - 1);
        assert_eq!(updated.review.consecutive_correct_count, k);
        assert_eq!(
            updated.review.next_review_at,
            clock.now_ms() + expected_days * DAY_MS
        );
        assert!(updated.review.next_review_at > previous_due);
        previous_due = updated.review.next_review_at;

        assert_eq!(service.count_due_words(book).unwrap(), 0);
        clock.set(updated.review.next_review_at);
    }

    assert!(service.due_words(book).unwrap().is_empty());
}

#[test]
fn record_outcome_on_missing_word_fails_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = ReviewService::with_clock(CountingRepo::new(&conn), FixedClock::new(NOW));

    let missing = Uuid::new_v4();
    let err = service
        .record_outcome(missing, ReviewOutcome::Correct)
        .unwrap_err();

    assert!(matches!(err, ReviewServiceError::NotFound(id) if id == missing));
    assert_eq!(service.repo().review_writes.get(), 0);
}

#[test]
fn recording_same_outcome_twice_advances_twice() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "twice");
    let service = ReviewService::with_clock(CountingRepo::new(&conn), FixedClock::new(NOW));

    service.record_outcome(word.id, ReviewOutcome::Correct).unwrap();
    let second = service
        .record_outcome(word.id, ReviewOutcome::Correct)
        .unwrap();

    // Not idempotent: each submission is a separate review.
    assert_eq!(second.review.consecutive_correct_count, 2);
    assert_eq!(second.review.next_review_at, NOW + 2 * DAY_MS);
    assert_eq!(service.repo().review_writes.get(), 2);
    assert_eq!(service.review_history(word.id).unwrap().len(), 2);
}

#[test]
fn concurrent_update_between_read_and_write_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "race");
    let repo = RacingRepo {
        inner: SqliteWordRepository::try_new(&conn).unwrap(),
    };
    let service = ReviewService::with_clock(repo, FixedClock::new(NOW));

    let err = service
        .record_outcome(word.id, ReviewOutcome::Incorrect)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Conflict(id) if id == word.id));

    // Only the competing write landed.
    let stored = SqliteWordRepository::try_new(&conn)
        .unwrap()
        .get_word(word.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.review.consecutive_correct_count, 1);
    let history = SqliteWordRepository::try_new(&conn)
        .unwrap()
        .list_review_records(word.id)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].outcome, ReviewOutcome::Correct);
}

#[test]
fn stale_conditional_update_reports_conflict_and_missing_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "stale");
    let repo = SqliteWordRepository::try_new(&conn).unwrap();

    let stale = ReviewStateUpdate {
        word_id: word.id,
        expected: ReviewState {
            consecutive_correct_count: 3,
            next_review_at: word.review.next_review_at,
        },
        next: ReviewState::initial(NOW),
        outcome: ReviewOutcome::Incorrect,
        reviewed_at: NOW,
    };
    assert!(matches!(
        repo.update_review_state(&stale),
        Err(RepoError::Conflict(id)) if id == word.id
    ));

    let missing = ReviewStateUpdate {
        word_id: Uuid::new_v4(),
        ..stale
    };
    assert!(matches!(
        repo.update_review_state(&missing),
        Err(RepoError::NotFound(_))
    ));
    assert!(repo.list_review_records(word.id).unwrap().is_empty());
}

#[test]
fn review_history_lists_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "history");
    let clock = FixedClock::new(NOW);
    let repo = SqliteWordRepository::try_new(&conn).unwrap();
    let service = ReviewService::with_clock(repo, &clock);

    service.record_outcome(word.id, ReviewOutcome::Correct).unwrap();
    clock.advance(DAY_MS);
    service
        .record_outcome(word.id, ReviewOutcome::Incorrect)
        .unwrap();

    let history = service.review_history(word.id).unwrap();
    let outcomes: Vec<_> = history.iter().map(|record| record.outcome).collect();
    assert_eq!(
        outcomes,
        vec![ReviewOutcome::Incorrect, ReviewOutcome::Correct]
    );
    assert_eq!(history[0].reviewed_at, NOW + DAY_MS);
    assert_eq!(history[0].consecutive_correct_count, 0);
    assert_eq!(history[1].next_review_at, NOW + DAY_MS);

    assert!(matches!(
        service.review_history(Uuid::new_v4()),
        Err(ReviewServiceError::NotFound(_))
    ));
}

#[test]
fn due_words_are_a_shuffled_permutation_of_the_due_set() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let mut seeded = Vec::new();
    for index in 0..20 {
        seeded.push(seed_word(&conn, book, &format!("term-{index}")).id);
    }

    let repo = SqliteWordRepository::try_new(&conn).unwrap();
    let service = ReviewService::with_clock(repo, FixedClock::new(NOW));

    let first = service
        .due_words_with_rng(book, &mut StdRng::seed_from_u64(1))
        .unwrap();
    let again = service
        .due_words_with_rng(book, &mut StdRng::seed_from_u64(1))
        .unwrap();
    let first_ids: Vec<_> = first.iter().map(|word| word.id).collect();
    let again_ids: Vec<_> = again.iter().map(|word| word.id).collect();

    assert_eq!(first_ids, again_ids);
    assert_eq!(
        first_ids.iter().copied().collect::<HashSet<_>>(),
        seeded.iter().copied().collect::<HashSet<_>>()
    );
    assert_ne!(first_ids, seeded, "20 items should not shuffle to identity");

    let page = service.due_words_page(book, 3).unwrap();
    let page_ids: Vec<_> = page.iter().map(|word| word.id).collect();
    assert_eq!(page_ids, seeded[..3].to_vec());
}

#[test]
fn corrupted_negative_streak_is_rejected_not_clamped() {
    let conn = open_db_in_memory().unwrap();
    let book = seed_book(&conn);
    let word = seed_word(&conn, book, "corrupt");
    conn.execute(
        "UPDATE words SET consecutive_correct_count = -2 WHERE id = ?1;",
        [word.id.to_string()],
    )
    .unwrap();

    let service = ReviewService::with_clock(CountingRepo::new(&conn), FixedClock::new(NOW));
    let err = service
        .record_outcome(word.id, ReviewOutcome::Correct)
        .unwrap_err();

    assert!(matches!(err, ReviewServiceError::InvalidState(_)));
    assert_eq!(service.repo().review_writes.get(), 0);
}
