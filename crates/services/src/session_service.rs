use std::sync::Arc;

use storage::repository::{BookRepository, SessionRepository};
use tracker_core::model::{BookId, ReadingSession, SessionDraft, SessionId, UserId};
use tracker_core::progress::{BookProgress, recompute};

use crate::Clock;
use crate::error::SessionServiceError;

/// Orchestrates reading-session mutations and the book recomputation each
/// one triggers.
///
/// Every mutation follows the same explicit two-step protocol: persist the
/// session change first, then recompute the owning book's progress over its
/// full session set and persist the derived status. The recomputation runs
/// in the same call, so a caller never observes a session write without the
/// matching status update.
#[derive(Clone)]
pub struct SessionService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    books: Arc<dyn BookRepository>,
}

impl SessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        books: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            books,
        }
    }

    /// Validate and persist a new session, then recompute the book.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::UnknownBook` if the target book does
    /// not belong to the draft's owner, `SessionServiceError::Session` for
    /// validation failures, and `SessionServiceError::Storage` if
    /// persistence fails.
    pub async fn log_session(
        &self,
        draft: SessionDraft,
    ) -> Result<(ReadingSession, BookProgress), SessionServiceError> {
        let user_id = draft.user_id;
        let book_id = draft.book_id;
        self.books
            .get_book(user_id, book_id)
            .await?
            .ok_or(SessionServiceError::UnknownBook)?;

        let validated = draft.validate(self.clock.now())?;
        let id = self.sessions.insert_session(&validated).await?;
        let session = validated.assign_id(id);

        let progress = self.recompute_book(user_id, book_id).await?;
        Ok((session, progress))
    }

    /// Fetch one of the owner's sessions.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` for a missing or
    /// foreign-owned row.
    pub async fn get_session(
        &self,
        user_id: UserId,
        id: SessionId,
    ) -> Result<ReadingSession, SessionServiceError> {
        self.sessions
            .get_session(user_id, id)
            .await?
            .ok_or(SessionServiceError::NotFound)
    }

    /// All sessions logged against one of the owner's books, most recent
    /// start first.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::UnknownBook` if the book does not
    /// belong to the owner.
    pub async fn list_for_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Vec<ReadingSession>, SessionServiceError> {
        self.books
            .get_book(user_id, book_id)
            .await?
            .ok_or(SessionServiceError::UnknownBook)?;
        Ok(self.sessions.list_sessions_for_book(book_id).await?)
    }

    /// Apply an edit to a session, then recompute the affected book(s).
    ///
    /// Moving a session to a different book recomputes both the old and the
    /// new book; the returned progress belongs to the session's new book.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` for a missing session,
    /// `SessionServiceError::UnknownBook` for a foreign target book,
    /// `SessionServiceError::Session` for validation failures, and
    /// `SessionServiceError::Storage` if persistence fails.
    pub async fn edit_session(
        &self,
        user_id: UserId,
        id: SessionId,
        draft: SessionDraft,
    ) -> Result<(ReadingSession, BookProgress), SessionServiceError> {
        let existing = self.get_session(user_id, id).await?;
        let previous_book = existing.book_id();

        let target_book = draft.book_id;
        self.books
            .get_book(user_id, target_book)
            .await?
            .ok_or(SessionServiceError::UnknownBook)?;

        let validated = draft.validate(self.clock.now())?;
        let updated = ReadingSession::from_persisted(
            id,
            user_id,
            validated.book_id,
            validated.pages_read,
            validated.started_at,
            validated.ended_at,
            validated.notes,
            existing.created_at(),
        )?;
        self.sessions.update_session(&updated).await?;

        if previous_book != target_book {
            let _ = self.recompute_book(user_id, previous_book).await?;
        }
        let progress = self.recompute_book(user_id, target_book).await?;
        Ok((updated, progress))
    }

    /// Delete one of the owner's sessions, then recompute its book.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` for a missing session and
    /// `SessionServiceError::Storage` if persistence fails.
    pub async fn delete_session(
        &self,
        user_id: UserId,
        id: SessionId,
    ) -> Result<BookProgress, SessionServiceError> {
        let existing = self.get_session(user_id, id).await?;
        self.sessions.delete_session(user_id, id).await?;
        self.recompute_book(user_id, existing.book_id()).await
    }

    /// Step two of the protocol: derive the book's status from its full
    /// session set and persist it.
    async fn recompute_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<BookProgress, SessionServiceError> {
        let mut book = self
            .books
            .get_book(user_id, book_id)
            .await?
            .ok_or(SessionServiceError::UnknownBook)?;
        let sessions = self.sessions.list_sessions_for_book(book_id).await?;
        let progress = recompute(&mut book, &sessions, self.clock.now());
        self.books.update_book(&book).await?;
        Ok(progress)
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
    use storage::repository::{BookRepository as _, InMemoryRepository};
    use tracker_core::model::{BookDraft, Genre, ReadingStatus};
    use tracker_core::time::{fixed_clock, fixed_now};
    use uuid::Uuid;

    fn owner() -> UserId {
        UserId::new(Uuid::from_u128(1))
    }

    fn build_service() -> (SessionService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let service = SessionService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (service, repo)
    }

    async fn insert_book(repo: &InMemoryRepository, total_pages: u32) -> BookId {
        let validated =
            BookDraft::new(owner(), "Dune", "Frank Herbert", total_pages, Genre::SciFiFantasy)
                .validate(fixed_now())
                .unwrap();
        repo.insert_book(&validated).await.unwrap()
    }

    fn draft(book_id: BookId, pages: u32) -> SessionDraft {
        let start = fixed_now();
        SessionDraft::new(owner(), book_id, pages, start, start + Duration::hours(1))
    }

    #[tokio::test]
    async fn logging_a_session_updates_the_book_status() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo, 200).await;

        let (session, progress) = service.log_session(draft(book_id, 80)).await.unwrap();
        assert_eq!(session.pages_read(), 80);
        assert_eq!(progress.percent, 40.0);
        assert!(!progress.newly_completed);

        let book = repo.get_book(owner(), book_id).await.unwrap().unwrap();
        assert_eq!(book.status(), ReadingStatus::CurrentlyReading);
    }

    #[tokio::test]
    async fn completion_fires_once_across_mutations() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo, 100).await;

        let (_, first) = service.log_session(draft(book_id, 60)).await.unwrap();
        assert!(!first.newly_completed);

        let (_, second) = service.log_session(draft(book_id, 40)).await.unwrap();
        assert!(second.newly_completed);
        assert_eq!(second.percent, 100.0);

        let (_, third) = service.log_session(draft(book_id, 10)).await.unwrap();
        assert!(!third.newly_completed);

        let book = repo.get_book(owner(), book_id).await.unwrap().unwrap();
        assert_eq!(book.status(), ReadingStatus::Completed);
    }

    #[tokio::test]
    async fn deleting_the_last_session_returns_the_book_to_unread() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo, 200).await;
        let (session, _) = service.log_session(draft(book_id, 80)).await.unwrap();

        let progress = service.delete_session(owner(), session.id()).await.unwrap();
        assert_eq!(progress.percent, 0.0);

        let book = repo.get_book(owner(), book_id).await.unwrap().unwrap();
        assert_eq!(book.status(), ReadingStatus::ToBeRead);
    }

    #[tokio::test]
    async fn moving_a_session_recomputes_both_books() {
        let (service, repo) = build_service();
        let first_book = insert_book(&repo, 100).await;
        let second_book = insert_book(&repo, 100).await;

        let (session, progress) = service.log_session(draft(first_book, 100)).await.unwrap();
        assert!(progress.newly_completed);

        let (moved, progress) = service
            .edit_session(owner(), session.id(), draft(second_book, 100))
            .await
            .unwrap();
        assert_eq!(moved.book_id(), second_book);
        assert!(progress.newly_completed);

        let old_book = repo.get_book(owner(), first_book).await.unwrap().unwrap();
        assert_eq!(old_book.status(), ReadingStatus::ToBeRead);
        let new_book = repo.get_book(owner(), second_book).await.unwrap().unwrap();
        assert_eq!(new_book.status(), ReadingStatus::Completed);
    }

    #[tokio::test]
    async fn editing_preserves_the_original_created_at() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo, 200).await;
        let (session, _) = service.log_session(draft(book_id, 40)).await.unwrap();

        let (edited, _) = service
            .edit_session(owner(), session.id(), draft(book_id, 60))
            .await
            .unwrap();
        assert_eq!(edited.created_at(), session.created_at());
        assert_eq!(edited.pages_read(), 60);
    }

    #[tokio::test]
    async fn logging_against_a_foreign_book_is_rejected() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo, 200).await;

        let stranger = UserId::new(Uuid::from_u128(2));
        let start = fixed_now();
        let foreign = SessionDraft::new(stranger, book_id, 10, start, start + Duration::hours(1));

        assert!(matches!(
            service.log_session(foreign).await.unwrap_err(),
            SessionServiceError::UnknownBook
        ));
    }

    #[tokio::test]
    async fn invalid_drafts_never_reach_storage() {
        let (service, repo) = build_service();
        let book_id = insert_book(&repo, 200).await;

        let start = fixed_now();
        let too_long =
            SessionDraft::new(owner(), book_id, 10, start, start + Duration::hours(25));
        assert!(matches!(
            service.log_session(too_long).await.unwrap_err(),
            SessionServiceError::Session(_)
        ));
        assert!(
            service
                .list_for_book(owner(), book_id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
