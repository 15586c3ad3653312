use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Book, ReadingGoal, ReadingSession};
use crate::progress::percentage;

//
// ─── GOAL PROGRESS ─────────────────────────────────────────────────────────────
//

/// Derived progress figures for one goal over its stored date range.
///
/// All page/book counts are window-scoped: the caller supplies only the
/// sessions whose start date falls inside `[start_date, end_date]` and only
/// the completed books reached through such sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub pages_read: u64,
    pub pages_remaining: u64,
    /// Pages per day needed to land the target by the end date; 0 once the
    /// goal has expired or is due today.
    pub pages_needed_per_day: u64,
    pub books_completed: u64,
    pub books_remaining: u64,
    pub pages_progress_pct: f64,
    pub books_progress_pct: f64,
    /// Days until the end date; negative once the goal has expired.
    pub days_remaining: i64,
}

impl GoalProgress {
    /// All-zero progress, used when a computation degrades.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            pages_read: 0,
            pages_remaining: 0,
            pages_needed_per_day: 0,
            books_completed: 0,
            books_remaining: 0,
            pages_progress_pct: 0.0,
            books_progress_pct: 0.0,
            days_remaining: 0,
        }
    }
}

/// Computes a goal's progress from window-scoped rows.
///
/// - `sessions` are the owner's sessions whose start date lies inside the
///   goal period (inclusive on both ends).
/// - `completed_books` are the owner's `Completed` books that have at least
///   one session dated inside the period; duplicates are counted once. A
///   book that flips to `Completed` outside the window still counts only if
///   one of its sessions falls inside it — that is the repository's filter.
/// - `today` drives `days_remaining` and the pages-per-day pace. With
///   `target_books == 0`, book tracking is off and both book percentages
///   and remainders stay 0.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn compute_goal_progress(
    goal: &ReadingGoal,
    sessions: &[ReadingSession],
    completed_books: &[Book],
    today: NaiveDate,
) -> GoalProgress {
    let pages_read: u64 = sessions.iter().map(|s| u64::from(s.pages_read())).sum();

    let distinct: HashSet<_> = completed_books.iter().map(Book::id).collect();
    let books_completed = distinct.len() as u64;

    let target_pages = u64::from(goal.target_pages());
    let target_books = u64::from(goal.target_books());

    let pages_remaining = target_pages.saturating_sub(pages_read);
    let books_remaining = if target_books > 0 {
        target_books.saturating_sub(books_completed)
    } else {
        0
    };

    let days_remaining = (goal.end_date() - today).num_days();
    let pages_needed_per_day = if days_remaining > 0 {
        pages_remaining.div_ceil(days_remaining as u64)
    } else {
        0
    };

    let books_progress_pct = if target_books > 0 {
        percentage(books_completed, target_books)
    } else {
        0.0
    };

    GoalProgress {
        pages_read,
        pages_remaining,
        pages_needed_per_day,
        books_completed,
        books_remaining,
        pages_progress_pct: percentage(pages_read, target_pages),
        books_progress_pct,
        days_remaining,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::model::{
        BookDraft, BookId, Genre, GoalDraft, GoalId, GoalType, ReadingStatus, SessionDraft,
        SessionId, UserId,
    };
    use crate::time::fixed_now;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn owner() -> UserId {
        UserId::new(Uuid::from_u128(1))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn build_goal(target_pages: u32, target_books: u32) -> ReadingGoal {
        let mut draft = GoalDraft::new(
            owner(),
            GoalType::Monthly,
            target_pages,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );
        draft.target_books = target_books;
        draft
            .validate(fixed_now())
            .unwrap()
            .assign_id(GoalId::new(1))
    }

    fn session_on(id: u64, book: u64, day: u32, pages: u32) -> ReadingSession {
        let start = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
        SessionDraft::new(
            owner(),
            BookId::new(book),
            pages,
            start,
            start + Duration::hours(1),
        )
        .validate(fixed_now())
        .unwrap()
        .assign_id(SessionId::new(id))
    }

    fn completed_book(id: u64) -> Book {
        let mut draft = BookDraft::new(owner(), "Book", "Author", 100, Genre::Other);
        draft.status = ReadingStatus::Completed;
        draft
            .validate(fixed_now())
            .unwrap()
            .assign_id(BookId::new(id))
    }

    #[test]
    fn pages_progress_and_pace() {
        let goal = build_goal(500, 0);
        let sessions = vec![session_on(1, 1, 5, 100), session_on(2, 1, 10, 150)];

        // 5 days left: Jan 26 -> Jan 31.
        let progress = compute_goal_progress(&goal, &sessions, &[], date(2024, 1, 26));

        assert_eq!(progress.pages_read, 250);
        assert_eq!(progress.pages_remaining, 250);
        assert_eq!(progress.pages_progress_pct, 50.0);
        assert_eq!(progress.days_remaining, 5);
        assert_eq!(progress.pages_needed_per_day, 50);
    }

    #[test]
    fn pace_rounds_up() {
        let goal = build_goal(500, 0);
        let sessions = vec![session_on(1, 1, 5, 248)];

        // 252 pages over 5 days: ceil(50.4) = 51.
        let progress = compute_goal_progress(&goal, &sessions, &[], date(2024, 1, 26));
        assert_eq!(progress.pages_needed_per_day, 51);
    }

    #[test]
    fn expired_goal_has_negative_days_and_no_pace() {
        let goal = build_goal(500, 0);
        let progress = compute_goal_progress(&goal, &[], &[], date(2024, 2, 5));

        assert_eq!(progress.days_remaining, -5);
        assert_eq!(progress.pages_needed_per_day, 0);
        assert_eq!(progress.pages_remaining, 500);
    }

    #[test]
    fn due_today_means_no_pace_division() {
        let goal = build_goal(500, 0);
        let progress = compute_goal_progress(&goal, &[], &[], date(2024, 1, 31));
        assert_eq!(progress.days_remaining, 0);
        assert_eq!(progress.pages_needed_per_day, 0);
    }

    #[test]
    fn overshoot_saturates_remaining_and_caps_percentage() {
        let goal = build_goal(200, 0);
        let sessions = vec![session_on(1, 1, 3, 350)];

        let progress = compute_goal_progress(&goal, &sessions, &[], date(2024, 1, 10));
        assert_eq!(progress.pages_remaining, 0);
        assert_eq!(progress.pages_progress_pct, 100.0);
        assert_eq!(progress.pages_needed_per_day, 0);
    }

    #[test]
    fn books_tracked_counts_distinct_ids() {
        let goal = build_goal(500, 4);
        let books = vec![completed_book(1), completed_book(1), completed_book(2)];

        let progress = compute_goal_progress(&goal, &[], &books, date(2024, 1, 15));
        assert_eq!(progress.books_completed, 2);
        assert_eq!(progress.books_remaining, 2);
        assert_eq!(progress.books_progress_pct, 50.0);
    }

    #[test]
    fn books_untracked_when_target_is_zero() {
        let goal = build_goal(500, 0);
        let books = vec![completed_book(1), completed_book(2)];

        let progress = compute_goal_progress(&goal, &[], &books, date(2024, 1, 15));
        assert_eq!(progress.books_completed, 2);
        assert_eq!(progress.books_remaining, 0);
        assert_eq!(progress.books_progress_pct, 0.0);
    }

    #[test]
    fn empty_window_yields_zero_pages() {
        let goal = build_goal(300, 1);
        let progress = compute_goal_progress(&goal, &[], &[], date(2024, 1, 2));
        assert_eq!(progress.pages_read, 0);
        assert_eq!(progress.pages_progress_pct, 0.0);
        assert_eq!(progress.books_remaining, 1);
    }

    #[test]
    fn zeroed_is_all_zero() {
        let zero = GoalProgress::zeroed();
        assert_eq!(zero.pages_read, 0);
        assert_eq!(zero.pages_progress_pct, 0.0);
        assert_eq!(zero.days_remaining, 0);
    }
}
