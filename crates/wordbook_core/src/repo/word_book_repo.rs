//! Word book repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Deleting a word book cascades to its words and their review records.
//! - Listing order is creation order.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::word_book::{normalize_title, WordBook, WordBookId};
use rusqlite::{params, Connection, Row};

const WORD_BOOK_COLUMNS: &[&str] = &["id", "title", "created_at", "updated_at"];

/// Persistence contract for word books.
pub trait WordBookRepository {
    fn create_word_book(&self, word_book: &WordBook) -> RepoResult<WordBookId>;
    fn get_word_book(&self, id: WordBookId) -> RepoResult<Option<WordBook>>;
    fn list_word_books(&self) -> RepoResult<Vec<WordBook>>;
    fn rename_word_book(&self, id: WordBookId, title: &str) -> RepoResult<()>;
    fn delete_word_book(&self, id: WordBookId) -> RepoResult<()>;
}

/// SQLite-backed word book repository.
pub struct SqliteWordBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWordBookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("word_books", WORD_BOOK_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl WordBookRepository for SqliteWordBookRepository<'_> {
    fn create_word_book(&self, word_book: &WordBook) -> RepoResult<WordBookId> {
        let title = normalize_title(&word_book.title)?;
        self.conn.execute(
            "INSERT INTO word_books (id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3);",
            params![word_book.id.to_string(), title, word_book.created_at],
        )?;
        Ok(word_book.id)
    }

    fn get_word_book(&self, id: WordBookId) -> RepoResult<Option<WordBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_at
             FROM word_books
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_word_book_row(row)?));
        }
        Ok(None)
    }

    fn list_word_books(&self) -> RepoResult<Vec<WordBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_at
             FROM word_books
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_word_book_row(row)?);
        }
        Ok(books)
    }

    fn rename_word_book(&self, id: WordBookId, title: &str) -> RepoResult<()> {
        let title = normalize_title(title)?;
        let changed = self.conn.execute(
            "UPDATE word_books
             SET
                title = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), title],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_word_book(&self, id: WordBookId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM word_books WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_word_book_row(row: &Row<'_>) -> RepoResult<WordBook> {
    let id_text: String = row.get("id")?;
    let title: String = row.get("title")?;
    Ok(WordBook {
        id: parse_uuid(&id_text, "word_books.id")?,
        title: normalize_title(&title)?,
        created_at: row.get("created_at")?,
    })
}
