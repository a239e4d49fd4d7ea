//! Spaced-repetition scheduling.
//!
//! # Responsibility
//! - Own the single exponential backoff policy used by every write path.
//!
//! # Invariants
//! - Policy functions are pure: same input state, outcome and `now` give the
//!   same output.

pub mod policy;
