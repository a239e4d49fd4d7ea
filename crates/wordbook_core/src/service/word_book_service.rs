//! Word book and word content use-cases.
//!
//! # Responsibility
//! - Create, rename, list and delete word books.
//! - Add, edit, list and delete words inside a word book.
//!
//! # Invariants
//! - Words are only added to existing word books.
//! - Editing content never touches review state.

use crate::clock::{Clock, SystemClock};
use crate::model::word::{Word, WordId, WordValidationError};
use crate::model::word_book::{WordBook, WordBookId};
use crate::repo::word_book_repo::WordBookRepository;
use crate::repo::word_repo::WordRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for word book and word content use-cases.
#[derive(Debug)]
pub enum WordBookServiceError {
    InvalidInput(WordValidationError),
    WordBookNotFound(WordBookId),
    WordNotFound(WordId),
    Repo(RepoError),
}

impl Display for WordBookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::WordBookNotFound(id) => write!(f, "word book not found: {id}"),
            Self::WordNotFound(id) => write!(f, "word not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WordBookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WordValidationError> for WordBookServiceError {
    fn from(value: WordValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for WordBookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

pub type WordBookServiceResult<T> = Result<T, WordBookServiceError>;

/// Facade over word book and word repositories.
pub struct WordBookService<B: WordBookRepository, W: WordRepository, C: Clock = SystemClock> {
    books: B,
    words: W,
    clock: C,
}

impl<B: WordBookRepository, W: WordRepository> WordBookService<B, W> {
    pub fn new(books: B, words: W) -> Self {
        Self::with_clock(books, words, SystemClock)
    }
}

impl<B: WordBookRepository, W: WordRepository, C: Clock> WordBookService<B, W, C> {
    pub fn with_clock(books: B, words: W, clock: C) -> Self {
        Self {
            books,
            words,
            clock,
        }
    }

    pub fn create_word_book(&self, title: &str) -> WordBookServiceResult<WordBook> {
        let book = WordBook::create(title, self.clock.now_ms())?;
        self.books.create_word_book(&book)?;
        info!(
            "event=word_book_create module=word_book status=ok word_book_id={}",
            book.id
        );
        Ok(book)
    }

    pub fn get_word_book(&self, id: WordBookId) -> WordBookServiceResult<WordBook> {
        self.books
            .get_word_book(id)?
            .ok_or(WordBookServiceError::WordBookNotFound(id))
    }

    pub fn list_word_books(&self) -> WordBookServiceResult<Vec<WordBook>> {
        Ok(self.books.list_word_books()?)
    }

    pub fn rename_word_book(&self, id: WordBookId, title: &str) -> WordBookServiceResult<WordBook> {
        self.books
            .rename_word_book(id, title)
            .map_err(|err| book_error(id, err))?;
        self.get_word_book(id)
    }

    /// Deletes a word book together with all of its words.
    pub fn delete_word_book(&self, id: WordBookId) -> WordBookServiceResult<()> {
        self.books
            .delete_word_book(id)
            .map_err(|err| book_error(id, err))?;
        info!(
            "event=word_book_delete module=word_book status=ok word_book_id={}",
            id
        );
        Ok(())
    }

    /// Adds a new word that is due immediately.
    pub fn add_word(
        &self,
        word_book_id: WordBookId,
        term: &str,
        meaning: &str,
    ) -> WordBookServiceResult<Word> {
        self.get_word_book(word_book_id)?;
        let word = Word::create(word_book_id, term, meaning, self.clock.now_ms())?;
        self.words.create_word(&word)?;
        info!(
            "event=word_create module=word status=ok word_id={} word_book_id={}",
            word.id, word_book_id
        );
        Ok(word)
    }

    pub fn get_word(&self, id: WordId) -> WordBookServiceResult<Word> {
        self.words
            .get_word(id)?
            .ok_or(WordBookServiceError::WordNotFound(id))
    }

    /// Lists words of an existing book in insertion order.
    pub fn list_words(&self, word_book_id: WordBookId) -> WordBookServiceResult<Vec<Word>> {
        self.get_word_book(word_book_id)?;
        Ok(self.words.list_words(word_book_id)?)
    }

    /// Replaces term and meaning; streak and due date are preserved.
    pub fn update_word_content(
        &self,
        id: WordId,
        term: &str,
        meaning: &str,
    ) -> WordBookServiceResult<Word> {
        let updated = self.get_word(id)?.with_content(term, meaning)?;
        self.words
            .update_word_content(&updated)
            .map_err(|err| word_error(id, err))?;
        Ok(updated)
    }

    pub fn delete_word(&self, id: WordId) -> WordBookServiceResult<()> {
        self.words.delete_word(id).map_err(|err| word_error(id, err))
    }
}

fn book_error(id: WordBookId, err: RepoError) -> WordBookServiceError {
    match err {
        RepoError::NotFound(_) => WordBookServiceError::WordBookNotFound(id),
        other => other.into(),
    }
}

fn word_error(id: WordId, err: RepoError) -> WordBookServiceError {
    match err {
        RepoError::NotFound(_) => WordBookServiceError::WordNotFound(id),
        other => other.into(),
    }
}
