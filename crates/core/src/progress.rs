use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Book, ReadingSession, ReadingStatus};

//
// ─── METRIC PRIMITIVES ─────────────────────────────────────────────────────────
//

/// Percentage of a target reached, capped at 100 and rounded to 1 decimal.
///
/// A zero denominator yields 0.0 — the safe default for "no target" rather
/// than an error path. Inputs are unsigned, so the result is always within
/// `0.0..=100.0`.
///
/// # Examples
///
/// ```
/// # use tracker_core::progress::percentage;
/// assert_eq!(percentage(50, 100), 50.0);
/// assert_eq!(percentage(150, 100), 100.0);
/// assert_eq!(percentage(42, 0), 0.0);
/// ```
#[must_use]
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = (numerator as f64 / denominator as f64) * 100.0;
    round_one_decimal(pct.min(100.0))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derives a reading status from a progress percentage.
///
/// `Abandoned` is sticky: once a user abandons a book, no amount of logged
/// pages reclassifies it. Otherwise 100% means `Completed`, anything above
/// zero means `CurrentlyReading`, and zero means `ToBeRead`.
#[must_use]
pub fn classify_status(progress_pct: f64, current: ReadingStatus) -> ReadingStatus {
    if current == ReadingStatus::Abandoned {
        return ReadingStatus::Abandoned;
    }
    if progress_pct >= 100.0 {
        ReadingStatus::Completed
    } else if progress_pct > 0.0 {
        ReadingStatus::CurrentlyReading
    } else {
        ReadingStatus::ToBeRead
    }
}

//
// ─── BOOK PROGRESS TRACKER ─────────────────────────────────────────────────────
//

/// Result of recomputing a book's progress from its sessions.
///
/// `newly_completed` fires exactly once per completion: it is true only on
/// the recomputation that moves the book into `Completed`, and false on
/// every subsequent recomputation with unchanged data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookProgress {
    pub percent: f64,
    pub newly_completed: bool,
}

/// Recomputes a book's progress percentage and derived status.
///
/// Sums `pages_read` across the supplied sessions — the caller provides the
/// book's full session set, and overlapping ranges are summed as logged,
/// not deduplicated. The book's status is updated in place (the caller
/// persists it); `now` stamps the update time when the status changes.
///
/// Idempotent: calling twice with unchanged sessions yields the same
/// percentage and `newly_completed == false` the second time.
#[must_use]
pub fn recompute(book: &mut Book, sessions: &[ReadingSession], now: DateTime<Utc>) -> BookProgress {
    let total_read: u64 = sessions.iter().map(|s| u64::from(s.pages_read())).sum();
    let percent = percentage(total_read, u64::from(book.total_pages()));

    let before = book.status();
    let after = classify_status(percent, before);
    if after != before {
        book.set_status(after, now);
    }

    BookProgress {
        percent,
        newly_completed: before != ReadingStatus::Completed && after == ReadingStatus::Completed,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
