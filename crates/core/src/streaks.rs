use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

//
// ─── DAILY TOTALS ──────────────────────────────────────────────────────────────
//

/// Pages read on one calendar day, across all of a user's books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub pages: u32,
}

/// Buckets per-day totals into a date-keyed map, summing duplicates.
#[must_use]
pub fn fold_daily_totals(totals: impl IntoIterator<Item = DailyTotal>) -> BTreeMap<NaiveDate, u32> {
    let mut map = BTreeMap::new();
    for total in totals {
        *map.entry(total.date).or_insert(0) += total.pages;
    }
    map
}

//
// ─── STREAKS ───────────────────────────────────────────────────────────────────
//

/// Consecutive-activity figures for the heatmap header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Length of the streak that is still alive today (one-day grace), or 0.
    pub current: u32,
    /// Longest run of consecutive active days inside the window.
    pub longest: u32,
}

impl StreakSummary {
    /// All-zero summary, used when a computation degrades.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            current: 0,
            longest: 0,
        }
    }
}

/// Computes current and longest activity streaks over a date window.
///
/// A day is active when its page total is above zero. The walk is a single
/// forward pass from `window_start` to `window_end` inclusive with O(1)
/// extra state. The current streak stays alive through a one-day grace
/// period: it is non-zero only if the most recent active day is `today` or
/// `today - 1` (active yesterday, nothing logged yet today).
#[must_use]
pub fn compute_streaks(
    daily_totals: &BTreeMap<NaiveDate, u32>,
    window_start: NaiveDate,
    window_end: NaiveDate,
    today: NaiveDate,
) -> StreakSummary {
    let mut run: u32 = 0;
    let mut longest: u32 = 0;
    let mut last_active: Option<NaiveDate> = None;
    let mut run_at_last_active: u32 = 0;

    let mut day = window_start;
    while day <= window_end {
        let active = daily_totals.get(&day).copied().unwrap_or(0) > 0;
        if active {
            run += 1;
            longest = longest.max(run);
            last_active = Some(day);
            run_at_last_active = run;
        } else {
            run = 0;
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }

    let current = match last_active {
        Some(last) if last >= today - Duration::days(1) => run_at_last_active,
        _ => 0,
    };

    StreakSummary { current, longest }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
