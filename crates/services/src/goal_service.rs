use std::sync::Arc;

use storage::repository::{BookRepository, GoalRepository, SessionRepository};
use tracker_core::goals::{GoalProgress, compute_goal_progress};
use tracker_core::model::{GoalDraft, GoalId, ReadingGoal, UserId};

use crate::Clock;
use crate::error::GoalServiceError;

/// Orchestrates reading-goal CRUD and the window-scoped progress lookups.
#[derive(Clone)]
pub struct GoalService {
    clock: Clock,
    goals: Arc<dyn GoalRepository>,
    sessions: Arc<dyn SessionRepository>,
    books: Arc<dyn BookRepository>,
}

impl GoalService {
    #[must_use]
    pub fn new(
        clock: Clock,
        goals: Arc<dyn GoalRepository>,
        sessions: Arc<dyn SessionRepository>,
        books: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            clock,
            goals,
            sessions,
            books,
        }
    }

    /// Validate and persist a new goal.
    ///
    /// The per-type period bound is enforced here and nowhere else; a goal
    /// that violates its cadence never gets stored.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Goal` for validation failures and
    /// `GoalServiceError::Storage` if persistence fails.
    pub async fn create_goal(&self, draft: GoalDraft) -> Result<ReadingGoal, GoalServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self.goals.insert_goal(&validated).await?;
        Ok(validated.assign_id(id))
    }

    /// Fetch one of the owner's goals.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::NotFound` for a missing or foreign-owned
    /// row.
    pub async fn get_goal(
        &self,
        user_id: UserId,
        id: GoalId,
    ) -> Result<ReadingGoal, GoalServiceError> {
        self.goals
            .get_goal(user_id, id)
            .await?
            .ok_or(GoalServiceError::NotFound)
    }

    /// List the owner's goals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` on repository failures.
    pub async fn list_goals(&self, user_id: UserId) -> Result<Vec<ReadingGoal>, GoalServiceError> {
        Ok(self.goals.list_goals(user_id).await?)
    }

    /// Apply an edit to a goal, re-running the creation-time validation.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::NotFound` for a missing row,
    /// `GoalServiceError::Goal` for validation failures, and
    /// `GoalServiceError::Storage` if persistence fails.
    pub async fn edit_goal(
        &self,
        user_id: UserId,
        id: GoalId,
        draft: GoalDraft,
    ) -> Result<ReadingGoal, GoalServiceError> {
        let existing = self.get_goal(user_id, id).await?;
        let validated = draft.validate(self.clock.now())?;

        let updated = ReadingGoal::from_persisted(
            id,
            user_id,
            validated.goal_type,
            validated.target_pages,
            validated.target_books,
            validated.start_date,
            validated.end_date,
            existing.created_at(),
        )?;
        self.goals.update_goal(&updated).await?;
        Ok(updated)
    }

    /// Delete one of the owner's goals.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` with `NotFound` inside for a
    /// missing or foreign-owned row.
    pub async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), GoalServiceError> {
        Ok(self.goals.delete_goal(user_id, id).await?)
    }

    /// The goal dashboards surface: the most recently created of the
    /// owner's currently active goals, if any.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` on repository failures.
    pub async fn active_goal(
        &self,
        user_id: UserId,
    ) -> Result<Option<ReadingGoal>, GoalServiceError> {
        let today = self.clock.today();
        Ok(self
            .goals
            .active_goals(user_id, today)
            .await?
            .into_iter()
            .next())
    }

    /// Window-scoped progress for one goal.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` on repository failures.
    pub async fn progress(&self, goal: &ReadingGoal) -> Result<GoalProgress, GoalServiceError> {
        let sessions = self
            .sessions
            .list_sessions_in_window(goal.user_id(), goal.start_date(), goal.end_date())
            .await?;
        let completed = self
            .books
            .completed_books_in_window(goal.user_id(), goal.start_date(), goal.end_date())
            .await?;
        Ok(compute_goal_progress(
            goal,
            &sessions,
            &completed,
            self.clock.today(),
        ))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storage::repository::{BookRepository as _, InMemoryRepository, SessionRepository as _};
    use tracker_core::model::{BookDraft, BookId, Genre, GoalType, ReadingStatus, SessionDraft};
    use tracker_core::time::{fixed_clock, fixed_now, fixed_today};
    use uuid::Uuid;

    fn owner() -> UserId {
        UserId::new(Uuid::from_u128(1))
    }

    fn build_service() -> (GoalService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let service = GoalService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (service, repo)
    }

    fn monthly_draft(target_pages: u32) -> GoalDraft {
        let today = fixed_today();
        GoalDraft::new(
            owner(),
            GoalType::Monthly,
            target_pages,
            today - Duration::days(10),
            today + Duration::days(20),
        )
    }

    async fn insert_book(repo: &InMemoryRepository) -> BookId {
        let validated = BookDraft::new(owner(), "Dune", "Frank Herbert", 400, Genre::SciFiFantasy)
            .validate(fixed_now())
            .unwrap();
        repo.insert_book(&validated).await.unwrap()
    }

    async fn log_pages(repo: &InMemoryRepository, book_id: BookId, pages: u32, days_ago: i64) {
        let start = fixed_now() - Duration::days(days_ago);
        let validated = SessionDraft::new(owner(), book_id, pages, start, start + Duration::hours(1))
            .validate(fixed_now())
            .unwrap();
        repo.insert_session(&validated).await.unwrap();
    }

    #[tokio::test]
    async fn create_rejects_type_bound_violations() {
        let (service, _repo) = build_service();
        let today = fixed_today();
        let bad = GoalDraft::new(owner(), GoalType::Daily, 50, today, today + Duration::days(1));

        assert!(matches!(
            service.create_goal(bad).await.unwrap_err(),
            GoalServiceError::Goal(_)
        ));
    }

    #[tokio::test]
    async fn progress_only_counts_sessions_in_window() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo).await;
        log_pages(&repo, book_id, 100, 5).await;
        log_pages(&repo, book_id, 150, 0).await;
        log_pages(&repo, book_id, 999, 20).await; // before the window opens

        let goal = service.create_goal(monthly_draft(500)).await.unwrap();
        let progress = service.progress(&goal).await.unwrap();

        assert_eq!(progress.pages_read, 250);
        assert_eq!(progress.pages_remaining, 250);
        assert_eq!(progress.pages_progress_pct, 50.0);
        assert_eq!(progress.days_remaining, 20);
        assert_eq!(progress.pages_needed_per_day, 13); // ceil(250 / 20)
    }

    #[tokio::test]
    async fn progress_counts_completed_books_reached_via_the_window() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo).await;
        log_pages(&repo, book_id, 400, 2).await;

        let mut book = repo.get_book(owner(), book_id).await.unwrap().unwrap();
        book.set_status(ReadingStatus::Completed, fixed_now());
        repo.update_book(&book).await.unwrap();

        let mut draft = monthly_draft(500);
        draft.target_books = 2;
        let goal = service.create_goal(draft).await.unwrap();

        let progress = service.progress(&goal).await.unwrap();
        assert_eq!(progress.books_completed, 1);
        assert_eq!(progress.books_remaining, 1);
        assert_eq!(progress.books_progress_pct, 50.0);
    }

    #[tokio::test]
    async fn active_goal_prefers_the_most_recently_created() {
        let (service, repo) = build_service();
        let today = fixed_today();

        let first = service.create_goal(monthly_draft(300)).await.unwrap();
        let second = service
            .create_goal(GoalDraft::new(
                owner(),
                GoalType::Weekly,
                100,
                today,
                today + Duration::days(6),
            ))
            .await
            .unwrap();

        // Same fixed clock means identical created_at; the id breaks the tie.
        assert!(second.id() > first.id());
        let active = service.active_goal(owner()).await.unwrap().unwrap();
        assert_eq!(active.id(), second.id());

        repo.delete_goal(owner(), second.id()).await.unwrap();
        let active = service.active_goal(owner()).await.unwrap().unwrap();
        assert_eq!(active.id(), first.id());
    }

    #[tokio::test]
    async fn expired_goals_are_not_active() {
        let (service, _repo) = build_service();
        let today = fixed_today();
        service
            .create_goal(GoalDraft::new(
                owner(),
                GoalType::Weekly,
                100,
                today - Duration::days(10),
                today - Duration::days(4),
            ))
            .await
            .unwrap();

        assert!(service.active_goal(owner()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn edit_revalidates_and_preserves_created_at() {
        let (service, _repo) = build_service();
        let goal = service.create_goal(monthly_draft(300)).await.unwrap();

        let edited = service
            .edit_goal(owner(), goal.id(), monthly_draft(600))
            .await
            .unwrap();
        assert_eq!(edited.target_pages(), 600);
        assert_eq!(edited.created_at(), goal.created_at());

        let today = fixed_today();
        let bad = GoalDraft::new(owner(), GoalType::Daily, 10, today, today + Duration::days(3));
        assert!(matches!(
            service.edit_goal(owner(), goal.id(), bad).await.unwrap_err(),
            GoalServiceError::Goal(_)
        ));
    }
}
