//! Exponential backoff review policy.
//!
//! # Responsibility
//! - Compute the next review state for a correct/incorrect outcome.
//! - Decide mastery and due-ness for a given instant.
//!
//! # Invariants
//! - Correct: streak `n' = n + 1`, due at `now + BACKOFF_BASE^(n' - 1)` days.
//! - Incorrect: streak resets to 0, due immediately at `now`.
//! - Arithmetic saturates; the transition is total for any prior streak.

use crate::model::review::{ReviewOutcome, ReviewState};

/// Streak length at which a word leaves due-selection.
pub const MASTERY_THRESHOLD: u32 = 5;
/// Growth factor of the review interval per correct outcome.
pub const BACKOFF_BASE: i64 = 2;
/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Interval in days granted after reaching `streak` consecutive correct answers.
///
/// Streak 1 -> 1 day, 2 -> 2 days, 3 -> 4 days, 4 -> 8 days, 5 -> 16 days.
/// Streak 0 (just failed) -> 0 days.
pub fn review_interval_days(streak: u32) -> i64 {
    if streak == 0 {
        return 0;
    }
    BACKOFF_BASE.saturating_pow(streak - 1)
}

/// Applies one outcome to `current` at instant `now_ms`.
pub fn next_review_state(current: ReviewState, outcome: ReviewOutcome, now_ms: i64) -> ReviewState {
    match outcome {
        ReviewOutcome::Correct => {
            let streak = current.consecutive_correct_count.saturating_add(1);
            let delay_ms = review_interval_days(streak).saturating_mul(DAY_MS);
            ReviewState {
                consecutive_correct_count: streak,
                next_review_at: now_ms.saturating_add(delay_ms),
            }
        }
        ReviewOutcome::Incorrect => ReviewState::initial(now_ms),
    }
}

/// Returns whether a streak has reached mastery.
pub fn is_mastered(streak: u32) -> bool {
    streak >= MASTERY_THRESHOLD
}

/// Returns whether a word with `state` may be presented at `now_ms`.
///
/// `never_reviewed` words are due regardless of their stored date; mastered
/// words are never due.
pub fn is_due(state: ReviewState, never_reviewed: bool, now_ms: i64) -> bool {
    !is_mastered(state.consecutive_correct_count)
        && (never_reviewed || state.next_review_at <= now_ms)
}

#[cfg(test)]
mod tests {
    use super::{
        is_due, is_mastered, next_review_state, review_interval_days, DAY_MS,
        MASTERY_THRESHOLD,
    };
    use crate::model::review::{ReviewOutcome, ReviewState};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn interval_doubles_from_one_day() {
        let days: Vec<i64> = (0..=5).map(review_interval_days).collect();
        assert_eq!(days, vec![0, 1, 2, 4, 8, 16]);
    }

    #[test]
    fn correct_streak_backs_off_exponentially_and_strictly() {
        let mut state = ReviewState::initial(NOW);
        let mut previous_due = state.next_review_at;
        for k in 1..=5u32 {
            state = next_review_state(state, ReviewOutcome::Correct, NOW);
            assert_eq!(state.consecutive_correct_count, k);
            assert_eq!(state.next_review_at, NOW + (1i64 << (k - 1)) * DAY_MS);
            assert!(state.next_review_at > previous_due);
            previous_due = state.next_review_at;
        }
        assert!(is_mastered(state.consecutive_correct_count));
    }

    #[test]
    fn incorrect_resets_from_any_streak() {
        for streak in [0, 1, 4, MASTERY_THRESHOLD, 40, u32::MAX] {
            let state = ReviewState {
                consecutive_correct_count: streak,
                next_review_at: NOW + 30 * DAY_MS,
            };
            let next = next_review_state(state, ReviewOutcome::Incorrect, NOW);
            assert_eq!(next.consecutive_correct_count, 0);
            assert!(next.next_review_at <= NOW);
        }
    }

    #[test]
    fn huge_streak_saturates_instead_of_overflowing() {
        let state = ReviewState {
            consecutive_correct_count: u32::MAX,
            next_review_at: NOW,
        };
        let next = next_review_state(state, ReviewOutcome::Correct, NOW);
        assert_eq!(next.consecutive_correct_count, u32::MAX);
        assert_eq!(next.next_review_at, i64::MAX);
    }

    #[test]
    fn due_predicate_honors_mastery_and_never_reviewed() {
        let future = ReviewState {
            consecutive_correct_count: 1,
            next_review_at: NOW + DAY_MS,
        };
        assert!(!is_due(future, false, NOW));
        assert!(is_due(future, true, NOW));

        let mastered = ReviewState {
            consecutive_correct_count: MASTERY_THRESHOLD,
            next_review_at: NOW - DAY_MS,
        };
        assert!(!is_due(mastered, false, NOW));
        assert!(!is_due(mastered, true, NOW));
    }
}
