//! Domain model for word books, words and their review state.
//!
//! # Responsibility
//! - Define canonical data structures used by the scheduler and services.
//! - Validate content at construction time instead of wrapping every field.
//!
//! # Invariants
//! - Every word and word book is identified by a stable UUID.
//! - A word's review state is only changed through the scheduling policy.

pub mod review;
pub mod word;
pub mod word_book;
