use std::sync::Arc;

use storage::repository::{BookRepository, SessionRepository};
use tracker_core::model::{Book, BookDraft, BookId, ReadingStatus, UserId};
use tracker_core::progress::{BookProgress, percentage, recompute};

use crate::Clock;
use crate::error::BookServiceError;

/// Orchestrates the book catalog: creation, edits, explicit status changes,
/// and the progress recomputation that follows each of them.
#[derive(Clone)]
pub struct BookService {
    clock: Clock,
    books: Arc<dyn BookRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl BookService {
    #[must_use]
    pub fn new(
        clock: Clock,
        books: Arc<dyn BookRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            books,
            sessions,
        }
    }

    /// Validate and persist a new book.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::Book` for validation failures and
    /// `BookServiceError::Storage` if persistence fails.
    pub async fn add_book(&self, draft: BookDraft) -> Result<Book, BookServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self.books.insert_book(&validated).await?;
        Ok(validated.assign_id(id))
    }

    /// Fetch one of the owner's books.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::NotFound` for a missing or foreign-owned
    /// row.
    pub async fn get_book(&self, user_id: UserId, id: BookId) -> Result<Book, BookServiceError> {
        self.books
            .get_book(user_id, id)
            .await?
            .ok_or(BookServiceError::NotFound)
    }

    /// List the owner's books, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::Storage` on repository failures.
    pub async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, BookServiceError> {
        Ok(self.books.list_books(user_id).await?)
    }

    /// List the owner's books with the given status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::Storage` on repository failures.
    pub async fn list_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<Vec<Book>, BookServiceError> {
        Ok(self.books.list_books_by_status(user_id, status).await?)
    }

    /// Apply an edit to a book, then recompute its derived status.
    ///
    /// Recomputing after the edit keeps the status consistent with the
    /// book's sessions even when the edit set the status field directly:
    /// a manual `Completed` with unfinished sessions reclassifies, while a
    /// manual `Abandoned` sticks.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::NotFound` for a missing row,
    /// `BookServiceError::Book` for validation failures, and
    /// `BookServiceError::Storage` if persistence fails.
    pub async fn edit_book(
        &self,
        user_id: UserId,
        id: BookId,
        draft: BookDraft,
    ) -> Result<(Book, BookProgress), BookServiceError> {
        let existing = self.get_book(user_id, id).await?;
        let now = self.clock.now();
        let validated = draft.validate(now)?;

        let mut book = Book::from_persisted(
            id,
            user_id,
            validated.title,
            validated.author,
            validated.isbn,
            validated.total_pages,
            validated.genre,
            validated.status,
            validated.cover,
            existing.created_at(),
            now,
        )?;

        let sessions = self.sessions.list_sessions_for_book(id).await?;
        let progress = recompute(&mut book, &sessions, now);
        self.books.update_book(&book).await?;

        Ok((book, progress))
    }

    /// Delete one of the owner's books; its sessions are removed with it.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::Storage` with `NotFound` inside for a
    /// missing or foreign-owned row.
    pub async fn delete_book(&self, user_id: UserId, id: BookId) -> Result<(), BookServiceError> {
        Ok(self.books.delete_book(user_id, id).await?)
    }

    /// Explicitly mark a book completed, then recompute.
    ///
    /// The recomputation makes `Completed` a derived state: if the book's
    /// sessions do not actually cover its pages, the status settles back on
    /// what the totals say.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::NotFound` for a missing row and
    /// `BookServiceError::Storage` if persistence fails.
    pub async fn mark_completed(
        &self,
        user_id: UserId,
        id: BookId,
    ) -> Result<(Book, BookProgress), BookServiceError> {
        self.set_status_and_recompute(user_id, id, ReadingStatus::Completed)
            .await
    }

    /// Explicitly abandon a book.
    ///
    /// Abandoned is sticky through the recomputation that follows, no
    /// matter what the session totals are.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::NotFound` for a missing row and
    /// `BookServiceError::Storage` if persistence fails.
    pub async fn mark_abandoned(
        &self,
        user_id: UserId,
        id: BookId,
    ) -> Result<(Book, BookProgress), BookServiceError> {
        self.set_status_and_recompute(user_id, id, ReadingStatus::Abandoned)
            .await
    }

    /// Current progress percentage for a book, without touching stored
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `BookServiceError::NotFound` for a missing row.
    pub async fn progress(&self, user_id: UserId, id: BookId) -> Result<f64, BookServiceError> {
        let book = self.get_book(user_id, id).await?;
        let pages = self.sessions.sum_pages_for_book(id).await?;
        Ok(percentage(pages, u64::from(book.total_pages())))
    }

    async fn set_status_and_recompute(
        &self,
        user_id: UserId,
        id: BookId,
        status: ReadingStatus,
    ) -> Result<(Book, BookProgress), BookServiceError> {
        let mut book = self.get_book(user_id, id).await?;
        let now = self.clock.now();
        book.set_status(status, now);

        let sessions = self.sessions.list_sessions_for_book(id).await?;
        let progress = recompute(&mut book, &sessions, now);
        self.books.update_book(&book).await?;

        Ok((book, progress))
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
    use storage::repository::InMemoryRepository;
    use tracker_core::model::{Genre, SessionDraft};
    use tracker_core::time::{fixed_clock, fixed_now};
    use uuid::Uuid;

    fn owner() -> UserId {
        UserId::new(Uuid::from_u128(1))
    }

    fn build_service() -> (BookService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let service = BookService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (service, repo)
    }

    async fn log_pages(repo: &InMemoryRepository, book_id: BookId, pages: u32) {
        use storage::repository::SessionRepository as _;
        let start = fixed_now();
        let validated = SessionDraft::new(owner(), book_id, pages, start, start + Duration::hours(1))
            .validate(fixed_now())
            .unwrap();
        repo.insert_session(&validated).await.unwrap();
    }

    #[tokio::test]
    async fn add_and_get_round_trips() {
        let (service, _repo) = build_service();
        let draft = BookDraft::new(owner(), "Dune", "Frank Herbert", 412, Genre::SciFiFantasy);
        let book = service.add_book(draft).await.unwrap();

        let fetched = service.get_book(owner(), book.id()).await.unwrap();
        assert_eq!(fetched, book);
    }

    #[tokio::test]
    async fn add_rejects_invalid_draft() {
        let (service, _repo) = build_service();
        let draft = BookDraft::new(owner(), "Dune", "Frank Herbert", 0, Genre::SciFiFantasy);
        assert!(matches!(
            service.add_book(draft).await.unwrap_err(),
            BookServiceError::Book(_)
        ));
    }

    #[tokio::test]
    async fn edit_recomputes_direct_status_changes() {
        let (service, repo) = build_service();
        let book = service
            .add_book(BookDraft::new(owner(), "Dune", "Frank Herbert", 200, Genre::SciFiFantasy))
            .await
            .unwrap();
        log_pages(&repo, book.id(), 100).await;

        // The user ticks "Completed" on the edit form at 50% progress; the
        // recomputation settles the status back on the session totals.
        let mut draft = BookDraft::new(owner(), "Dune", "Frank Herbert", 200, Genre::SciFiFantasy);
        draft.status = ReadingStatus::Completed;
        let (edited, progress) = service.edit_book(owner(), book.id(), draft).await.unwrap();

        assert_eq!(progress.percent, 50.0);
        assert!(!progress.newly_completed);
        assert_eq!(edited.status(), ReadingStatus::CurrentlyReading);
        assert_eq!(edited.created_at(), book.created_at());
    }

    #[tokio::test]
    async fn mark_completed_sticks_only_when_pages_agree() {
        let (service, repo) = build_service();
        let book = service
            .add_book(BookDraft::new(owner(), "Dune", "Frank Herbert", 100, Genre::SciFiFantasy))
            .await
            .unwrap();

        log_pages(&repo, book.id(), 100).await;
        let (completed, progress) = service.mark_completed(owner(), book.id()).await.unwrap();
        assert_eq!(completed.status(), ReadingStatus::Completed);
        assert!(progress.newly_completed);
    }

    #[tokio::test]
    async fn mark_abandoned_survives_recompute() {
        let (service, repo) = build_service();
        let book = service
            .add_book(BookDraft::new(owner(), "Dune", "Frank Herbert", 200, Genre::SciFiFantasy))
            .await
            .unwrap();
        log_pages(&repo, book.id(), 120).await;

        let (abandoned, progress) = service.mark_abandoned(owner(), book.id()).await.unwrap();
        assert_eq!(abandoned.status(), ReadingStatus::Abandoned);
        assert_eq!(progress.percent, 60.0);
        assert!(!progress.newly_completed);

        let fetched = service.get_book(owner(), book.id()).await.unwrap();
        assert_eq!(fetched.status(), ReadingStatus::Abandoned);
    }

    #[tokio::test]
    async fn progress_reads_without_mutating() {
        let (service, repo) = build_service();
        let book = service
            .add_book(BookDraft::new(owner(), "Dune", "Frank Herbert", 400, Genre::SciFiFantasy))
            .await
            .unwrap();
        log_pages(&repo, book.id(), 100).await;

        assert_eq!(service.progress(owner(), book.id()).await.unwrap(), 25.0);
        // Stored status is untouched until a mutation path recomputes it.
        let fetched = service.get_book(owner(), book.id()).await.unwrap();
        assert_eq!(fetched.status(), ReadingStatus::ToBeRead);
    }

    #[tokio::test]
    async fn foreign_books_are_invisible() {
        let (service, _repo) = build_service();
        let book = service
            .add_book(BookDraft::new(owner(), "Dune", "Frank Herbert", 400, Genre::SciFiFantasy))
            .await
            .unwrap();

        let stranger = UserId::new(Uuid::from_u128(2));
        assert!(matches!(
            service.get_book(stranger, book.id()).await.unwrap_err(),
            BookServiceError::NotFound
        ));
    }
}
