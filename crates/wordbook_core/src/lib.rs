//! Core domain logic for word books and their review scheduler.
//! This crate is the single source of truth for scheduling invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig};
pub use model::review::{ReviewOutcome, ReviewState};
pub use model::word::{Word, WordId, WordValidationError};
pub use model::word_book::{WordBook, WordBookId};
pub use repo::word_book_repo::{SqliteWordBookRepository, WordBookRepository};
pub use repo::word_repo::{
    DueWordQuery, ReviewRecord, ReviewStateUpdate, SqliteWordRepository, WordRepository,
};
pub use repo::{RepoError, RepoResult};
pub use schedule::policy::{BACKOFF_BASE, DAY_MS, MASTERY_THRESHOLD};
pub use service::review_service::{ReviewResult, ReviewService, ReviewServiceError};
pub use service::word_book_service::{
    WordBookService, WordBookServiceError, WordBookServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
