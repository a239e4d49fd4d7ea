//! Command-line front end for word books and review sessions.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Translate commands into core service calls and print JSON to stdout.

mod view;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;
use view::{DueCountView, DueWordView, ReviewRecordView, ReviewSubmission, WordBookView};
use wordbook_core::db::open_db;
use wordbook_core::{
    default_log_level, init_logging, ReviewOutcome, ReviewService, SqliteWordBookRepository,
    SqliteWordRepository, WordBookService,
};

#[derive(Debug, Parser)]
#[command(name = "wordbook", version, about = "Vocabulary word books with spaced review")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "WORDBOOK_DB", default_value = "wordbook.sqlite3")]
    db: PathBuf,

    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "WORDBOOK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "WORDBOOK_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage word books.
    #[command(subcommand)]
    Book(BookCommand),
    /// Manage words inside a word book.
    #[command(subcommand)]
    Word(WordCommand),
    /// Inspect words due for review.
    #[command(subcommand)]
    Due(DueCommand),
    /// Record review outcomes.
    #[command(subcommand)]
    Review(ReviewCommand),
}

#[derive(Debug, Subcommand)]
enum BookCommand {
    Create { title: String },
    List,
    Rename { id: Uuid, title: String },
    Delete { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum WordCommand {
    Add {
        book_id: Uuid,
        term: String,
        meaning: String,
    },
    List { book_id: Uuid },
    Edit {
        id: Uuid,
        term: String,
        meaning: String,
    },
    Delete { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum DueCommand {
    /// Shuffled due words; with --limit, the first N in insertion order.
    List {
        book_id: Uuid,
        #[arg(long)]
        limit: Option<u32>,
    },
    Count { book_id: Uuid },
}

#[derive(Debug, Subcommand)]
enum ReviewCommand {
    /// Record one outcome for a word.
    Record { word_id: Uuid, result: ResultArg },
    /// Record one outcome from a `{"wordId": ..., "result": ...}` payload.
    Submit { payload: String },
    /// Show the review history of a word, newest first.
    History { word_id: Uuid },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResultArg {
    Correct,
    Incorrect,
}

impl From<ResultArg> for ReviewOutcome {
    fn from(value: ResultArg) -> Self {
        match value {
            ResultArg::Correct => ReviewOutcome::Correct,
            ResultArg::Incorrect => ReviewOutcome::Incorrect,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(|err| anyhow!(err))?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    debug!("event=cli_command module=cli status=start command={:?}", cli.command);

    match cli.command {
        Command::Book(command) => run_book(&conn, command),
        Command::Word(command) => run_word(&conn, command),
        Command::Due(command) => run_due(&conn, command),
        Command::Review(command) => run_review(&conn, command),
    }
}

fn books(
    conn: &rusqlite::Connection,
) -> Result<WordBookService<SqliteWordBookRepository<'_>, SqliteWordRepository<'_>>> {
    Ok(WordBookService::new(
        SqliteWordBookRepository::try_new(conn)?,
        SqliteWordRepository::try_new(conn)?,
    ))
}

fn reviews(conn: &rusqlite::Connection) -> Result<ReviewService<SqliteWordRepository<'_>>> {
    Ok(ReviewService::new(SqliteWordRepository::try_new(conn)?))
}

fn run_book(conn: &rusqlite::Connection, command: BookCommand) -> Result<()> {
    let service = books(conn)?;
    match command {
        BookCommand::Create { title } => {
            print_json(&WordBookView::from(&service.create_word_book(&title)?))
        }
        BookCommand::List => {
            let views: Vec<_> = service
                .list_word_books()?
                .iter()
                .map(WordBookView::from)
                .collect();
            print_json(&views)
        }
        BookCommand::Rename { id, title } => {
            print_json(&WordBookView::from(&service.rename_word_book(id, &title)?))
        }
        BookCommand::Delete { id } => {
            service.delete_word_book(id)?;
            print_json(&serde_json::json!({ "ok": true }))
        }
    }
}

fn run_word(conn: &rusqlite::Connection, command: WordCommand) -> Result<()> {
    let service = books(conn)?;
    match command {
        WordCommand::Add {
            book_id,
            term,
            meaning,
        } => {
            let word = service.add_word(book_id, &term, &meaning)?;
            print_json(&DueWordView::from(&word))
        }
        WordCommand::List { book_id } => {
            let views: Vec<_> = service
                .list_words(book_id)?
                .iter()
                .map(DueWordView::from)
                .collect();
            print_json(&views)
        }
        WordCommand::Edit { id, term, meaning } => {
            let word = service.update_word_content(id, &term, &meaning)?;
            print_json(&DueWordView::from(&word))
        }
        WordCommand::Delete { id } => {
            service.delete_word(id)?;
            print_json(&serde_json::json!({ "ok": true }))
        }
    }
}

fn run_due(conn: &rusqlite::Connection, command: DueCommand) -> Result<()> {
    let service = reviews(conn)?;
    match command {
        DueCommand::List { book_id, limit } => {
            let words = match limit {
                Some(limit) => service.due_words_page(book_id, limit)?,
                None => service.due_words(book_id)?,
            };
            let views: Vec<_> = words.iter().map(DueWordView::from).collect();
            print_json(&views)
        }
        DueCommand::Count { book_id } => print_json(&DueCountView {
            word_book_id: book_id,
            due: service.count_due_words(book_id)?,
        }),
    }
}

fn run_review(conn: &rusqlite::Connection, command: ReviewCommand) -> Result<()> {
    let service = reviews(conn)?;
    match command {
        ReviewCommand::Record { word_id, result } => {
            let word = service.record_outcome(word_id, result.into())?;
            print_json(&DueWordView::from(&word))
        }
        ReviewCommand::Submit { payload } => {
            let submission: ReviewSubmission =
                serde_json::from_str(&payload).context("invalid review submission payload")?;
            let word = service.record_outcome(submission.word_id, submission.result)?;
            print_json(&DueWordView::from(&word))
        }
        ReviewCommand::History { word_id } => {
            let views: Vec<_> = service
                .review_history(word_id)?
                .iter()
                .map(ReviewRecordView::from)
                .collect();
            print_json(&views)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
