use std::sync::Arc;

use chrono::Duration;
use tracing::warn;

use storage::repository::{BookRepository, GenreCount, GoalRepository, SessionRepository};
use tracker_core::goals::{GoalProgress, compute_goal_progress};
use tracker_core::model::{Book, ReadingGoal, ReadingStatus, UserId};
use tracker_core::streaks::{DailyTotal, StreakSummary, compute_streaks, fold_daily_totals};

use crate::Clock;
use crate::error::DashboardError;

/// Window for the "pages read recently" stat and the activity series.
pub const DASHBOARD_RECENT_DAYS: i64 = 30;

/// Window the streak calculator walks for the heatmap header.
pub const STREAK_WINDOW_DAYS: i64 = 90;

/// The active goal joined with its computed progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveGoalProgress {
    pub goal: ReadingGoal,
    pub progress: GoalProgress,
}

/// Everything the dashboard page renders.
///
/// Individual metrics degrade to zeroed values rather than failing the
/// whole summary; each degradation appends a human-readable entry to
/// `warnings` so the presentation layer can flag stale numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_books: u64,
    pub books_completed: u64,
    pub currently_reading: Vec<Book>,
    pub pages_last_30_days: u64,
    pub active_goal: Option<ActiveGoalProgress>,
    pub warnings: Vec<String>,
}

/// Assembles dashboard and analytics figures from repository aggregations.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    books: Arc<dyn BookRepository>,
    sessions: Arc<dyn SessionRepository>,
    goals: Arc<dyn GoalRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        clock: Clock,
        books: Arc<dyn BookRepository>,
        sessions: Arc<dyn SessionRepository>,
        goals: Arc<dyn GoalRepository>,
    ) -> Self {
        Self {
            clock,
            books,
            sessions,
            goals,
        }
    }

    /// Build the dashboard summary for one user.
    ///
    /// Never fails: every metric that cannot be computed is served as zero
    /// (or empty) with a warning, so one bad aggregation does not take the
    /// page down.
    pub async fn summary(&self, user_id: UserId) -> DashboardSummary {
        let mut warnings = Vec::new();

        let total_books = self
            .books
            .count_books(user_id)
            .await
            .unwrap_or_else(|err| degraded(&mut warnings, user_id, "total books", &err, 0));

        let books_completed = self
            .books
            .count_books_by_status(user_id, ReadingStatus::Completed)
            .await
            .unwrap_or_else(|err| degraded(&mut warnings, user_id, "completed books", &err, 0));

        let currently_reading = self
            .books
            .list_books_by_status(user_id, ReadingStatus::CurrentlyReading)
            .await
            .unwrap_or_else(|err| {
                degraded(&mut warnings, user_id, "currently reading", &err, Vec::new())
            });

        let since = self.clock.now() - Duration::days(DASHBOARD_RECENT_DAYS);
        let pages_last_30_days = self
            .sessions
            .sum_pages_since(user_id, since)
            .await
            .unwrap_or_else(|err| degraded(&mut warnings, user_id, "recent pages", &err, 0));

        let active_goal = self.active_goal_progress(user_id, &mut warnings).await;

        DashboardSummary {
            total_books,
            books_completed,
            currently_reading,
            pages_last_30_days,
            active_goal,
            warnings,
        }
    }

    /// Current and longest streak over the last [`STREAK_WINDOW_DAYS`] days.
    ///
    /// Degrades to an all-zero summary if the daily totals cannot be read.
    pub async fn streaks(&self, user_id: UserId) -> StreakSummary {
        let today = self.clock.today();
        let window_start = today - Duration::days(STREAK_WINDOW_DAYS - 1);

        match self
            .sessions
            .daily_page_totals(user_id, window_start, today)
            .await
        {
            Ok(totals) => {
                let by_day = fold_daily_totals(totals);
                compute_streaks(&by_day, window_start, today, today)
            }
            Err(err) => {
                warn!(user = %user_id, error = %err, "streak computation degraded to zero");
                StreakSummary::zeroed()
            }
        }
    }

    /// Daily page totals over the last [`DASHBOARD_RECENT_DAYS`] days, for
    /// the reading-activity chart. Days without sessions are absent.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn daily_activity(&self, user_id: UserId) -> Result<Vec<DailyTotal>, DashboardError> {
        let today = self.clock.today();
        let window_start = today - Duration::days(DASHBOARD_RECENT_DAYS - 1);
        Ok(self
            .sessions
            .daily_page_totals(user_id, window_start, today)
            .await?)
    }

    /// Book counts per genre for the distribution chart, most common first.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn genre_distribution(
        &self,
        user_id: UserId,
    ) -> Result<Vec<GenreCount>, DashboardError> {
        Ok(self.books.genre_distribution(user_id).await?)
    }

    async fn active_goal_progress(
        &self,
        user_id: UserId,
        warnings: &mut Vec<String>,
    ) -> Option<ActiveGoalProgress> {
        let today = self.clock.today();
        let goal = match self.goals.active_goals(user_id, today).await {
            Ok(goals) => goals.into_iter().next()?,
            Err(err) => {
                warn!(user = %user_id, error = %err, "active goal lookup degraded");
                warnings.push(format!("active goal unavailable: {err}"));
                return None;
            }
        };

        let sessions = self
            .sessions
            .list_sessions_in_window(user_id, goal.start_date(), goal.end_date())
            .await;
        let completed = self
            .books
            .completed_books_in_window(user_id, goal.start_date(), goal.end_date())
            .await;

        let progress = match (sessions, completed) {
            (Ok(sessions), Ok(completed)) => {
                compute_goal_progress(&goal, &sessions, &completed, today)
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(user = %user_id, goal = %goal.id(), error = %err,
                      "goal progress degraded to zero");
                warnings.push(format!("goal progress unavailable: {err}"));
                GoalProgress::zeroed()
            }
        };

        Some(ActiveGoalProgress { goal, progress })
    }
}

fn degraded<T>(
    warnings: &mut Vec<String>,
    user_id: UserId,
    metric: &str,
    err: &storage::repository::StorageError,
    fallback: T,
) -> T {
    warn!(user = %user_id, error = %err, metric, "dashboard metric degraded to zero");
    warnings.push(format!("{metric} unavailable: {err}"));
    fallback
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
