use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use tracker_core::model::{
    Book, BookId, Genre, GoalId, ReadingGoal, ReadingSession, ReadingStatus, SessionId, UserId,
    UserProfile, ValidatedBook, ValidatedGoal, ValidatedSession,
};
use tracker_core::streaks::DailyTotal;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Book count for one genre, newest-heavy views sort on `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenreCount {
    pub genre: Genre,
    pub count: u64,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for the book catalog.
///
/// Every read and write is owner-scoped: a wrong `user_id` behaves exactly
/// like a missing row, so cross-user access never reaches the callers.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Persist a validated book and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the book cannot be stored.
    async fn insert_book(&self, book: &ValidatedBook) -> Result<BookId, StorageError>;

    /// Fetch one of the owner's books.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing or
    /// foreign-owned row is `Ok(None)`.
    async fn get_book(&self, user_id: UserId, id: BookId) -> Result<Option<Book>, StorageError>;

    /// List the owner's books, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, StorageError>;

    /// List the owner's books with the given status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<Vec<Book>, StorageError>;

    /// Persist an updated book.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or owned by
    /// someone else.
    async fn update_book(&self, book: &Book) -> Result<(), StorageError>;

    /// Delete one of the owner's books; its sessions go with it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or owned by
    /// someone else.
    async fn delete_book(&self, user_id: UserId, id: BookId) -> Result<(), StorageError>;

    /// Total number of books on the owner's shelf.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_books(&self, user_id: UserId) -> Result<u64, StorageError>;

    /// Number of the owner's books with the given status.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<u64, StorageError>;

    /// Book counts grouped by genre, most common first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn genre_distribution(&self, user_id: UserId) -> Result<Vec<GenreCount>, StorageError>;

    /// The owner's `Completed` books that have at least one session whose
    /// start date falls inside `[from, until]`. Each book appears once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn completed_books_in_window(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Book>, StorageError>;
}

/// Repository contract for reading sessions and their aggregations.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a validated session and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError>;

    /// Fetch one of the owner's sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing or
    /// foreign-owned row is `Ok(None)`.
    async fn get_session(
        &self,
        user_id: UserId,
        id: SessionId,
    ) -> Result<Option<ReadingSession>, StorageError>;

    /// All sessions logged against a book, most recent start first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sessions_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<ReadingSession>, StorageError>;

    /// The owner's sessions whose start date falls inside `[from, until]`,
    /// oldest start first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sessions_in_window(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ReadingSession>, StorageError>;

    /// Persist an updated session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or owned by
    /// someone else.
    async fn update_session(&self, session: &ReadingSession) -> Result<(), StorageError>;

    /// Delete one of the owner's sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or owned by
    /// someone else.
    async fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), StorageError>;

    /// Sum of pages across all sessions for a book.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn sum_pages_for_book(&self, book_id: BookId) -> Result<u64, StorageError>;

    /// Sum of the owner's pages across sessions starting at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn sum_pages_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// Per-day page totals for the owner inside `[from, until]`, ascending
    /// by date; days without activity are absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn daily_page_totals(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyTotal>, StorageError>;
}

/// Repository contract for reading goals.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Persist a validated goal and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the goal cannot be stored.
    async fn insert_goal(&self, goal: &ValidatedGoal) -> Result<GoalId, StorageError>;

    /// Fetch one of the owner's goals.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing or
    /// foreign-owned row is `Ok(None)`.
    async fn get_goal(
        &self,
        user_id: UserId,
        id: GoalId,
    ) -> Result<Option<ReadingGoal>, StorageError>;

    /// List the owner's goals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_goals(&self, user_id: UserId) -> Result<Vec<ReadingGoal>, StorageError>;

    /// The owner's goals whose period contains `today`, most recently
    /// created first (ties broken by highest id).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn active_goals(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReadingGoal>, StorageError>;

    /// Persist an updated goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or owned by
    /// someone else.
    async fn update_goal(&self, goal: &ReadingGoal) -> Result<(), StorageError>;

    /// Delete one of the owner's goals.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or owned by
    /// someone else.
    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), StorageError>;
}

/// Repository contract for user profiles (one row per account).
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace the owner's profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;

    /// Fetch the owner's profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing row is
    /// `Ok(None)`.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    books: HashMap<BookId, Book>,
    sessions: HashMap<SessionId, ReadingSession>,
    goals: HashMap<GoalId, ReadingGoal>,
    profiles: HashMap<UserId, UserProfile>,
    next_book_id: u64,
    next_session_id: u64,
    next_goal_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut InMemoryState) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        f(&mut guard)
    }
}

fn newest_first(a: &(DateTime<Utc>, u64), b: &(DateTime<Utc>, u64)) -> std::cmp::Ordering {
    b.cmp(a)
}

#[async_trait]
impl BookRepository for InMemoryRepository {
    async fn insert_book(&self, book: &ValidatedBook) -> Result<BookId, StorageError> {
        self.with_state(|state| {
            state.next_book_id += 1;
            let id = BookId::new(state.next_book_id);
            state.books.insert(id, book.clone().assign_id(id));
            Ok(id)
        })
    }

    async fn get_book(&self, user_id: UserId, id: BookId) -> Result<Option<Book>, StorageError> {
        self.with_state(|state| {
            Ok(state
                .books
                .get(&id)
                .filter(|b| b.user_id() == user_id)
                .cloned())
        })
    }

    async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, StorageError> {
        self.with_state(|state| {
            let mut books: Vec<Book> = state
                .books
                .values()
                .filter(|b| b.user_id() == user_id)
                .cloned()
                .collect();
            books.sort_by(|a, b| {
                newest_first(
                    &(a.created_at(), a.id().value()),
                    &(b.created_at(), b.id().value()),
                )
            });
            Ok(books)
        })
    }

    async fn list_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<Vec<Book>, StorageError> {
        let mut books = self.list_books(user_id).await?;
        books.retain(|b| b.status() == status);
        Ok(books)
    }

    async fn update_book(&self, book: &Book) -> Result<(), StorageError> {
        self.with_state(|state| {
            match state.books.get(&book.id()) {
                Some(existing) if existing.user_id() == book.user_id() => {}
                _ => return Err(StorageError::NotFound),
            }
            state.books.insert(book.id(), book.clone());
            Ok(())
        })
    }

    async fn delete_book(&self, user_id: UserId, id: BookId) -> Result<(), StorageError> {
        self.with_state(|state| {
            match state.books.get(&id) {
                Some(existing) if existing.user_id() == user_id => {}
                _ => return Err(StorageError::NotFound),
            }
            state.books.remove(&id);
            state.sessions.retain(|_, s| s.book_id() != id);
            Ok(())
        })
    }

    async fn count_books(&self, user_id: UserId) -> Result<u64, StorageError> {
        self.with_state(|state| {
            Ok(state
                .books
                .values()
                .filter(|b| b.user_id() == user_id)
                .count() as u64)
        })
    }

    async fn count_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<u64, StorageError> {
        self.with_state(|state| {
            Ok(state
                .books
                .values()
                .filter(|b| b.user_id() == user_id && b.status() == status)
                .count() as u64)
        })
    }

    async fn genre_distribution(&self, user_id: UserId) -> Result<Vec<GenreCount>, StorageError> {
        self.with_state(|state| {
            let mut counts: HashMap<Genre, u64> = HashMap::new();
            for book in state.books.values().filter(|b| b.user_id() == user_id) {
                *counts.entry(book.genre()).or_insert(0) += 1;
            }
            let mut out: Vec<GenreCount> = counts
                .into_iter()
                .map(|(genre, count)| GenreCount { genre, count })
                .collect();
            out.sort_by(|a, b| b.count.cmp(&a.count).then(a.genre.cmp(&b.genre)));
            Ok(out)
        })
    }

    async fn completed_books_in_window(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Book>, StorageError> {
        self.with_state(|state| {
            let mut books: Vec<Book> = state
                .books
                .values()
                .filter(|b| b.user_id() == user_id && b.status() == ReadingStatus::Completed)
                .filter(|b| {
                    state.sessions.values().any(|s| {
                        s.book_id() == b.id()
                            && s.started_on() >= from
                            && s.started_on() <= until
                    })
                })
                .cloned()
                .collect();
            books.sort_by(|a, b| {
                newest_first(
                    &(a.created_at(), a.id().value()),
                    &(b.created_at(), b.id().value()),
                )
            });
            Ok(books)
        })
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError> {
        self.with_state(|state| {
            state.next_session_id += 1;
            let id = SessionId::new(state.next_session_id);
            state.sessions.insert(id, session.clone().assign_id(id));
            Ok(id)
        })
    }

    async fn get_session(
        &self,
        user_id: UserId,
        id: SessionId,
    ) -> Result<Option<ReadingSession>, StorageError> {
        self.with_state(|state| {
            Ok(state
                .sessions
                .get(&id)
                .filter(|s| s.user_id() == user_id)
                .cloned())
        })
    }

    async fn list_sessions_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<ReadingSession>, StorageError> {
        self.with_state(|state| {
            let mut sessions: Vec<ReadingSession> = state
                .sessions
                .values()
                .filter(|s| s.book_id() == book_id)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| {
                newest_first(
                    &(a.started_at(), a.id().value()),
                    &(b.started_at(), b.id().value()),
                )
            });
            Ok(sessions)
        })
    }

    async fn list_sessions_in_window(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ReadingSession>, StorageError> {
        self.with_state(|state| {
            let mut sessions: Vec<ReadingSession> = state
                .sessions
                .values()
                .filter(|s| {
                    s.user_id() == user_id && s.started_on() >= from && s.started_on() <= until
                })
                .cloned()
                .collect();
            sessions.sort_by_key(|s| (s.started_at(), s.id().value()));
            Ok(sessions)
        })
    }

    async fn update_session(&self, session: &ReadingSession) -> Result<(), StorageError> {
        self.with_state(|state| {
            match state.sessions.get(&session.id()) {
                Some(existing) if existing.user_id() == session.user_id() => {}
                _ => return Err(StorageError::NotFound),
            }
            state.sessions.insert(session.id(), session.clone());
            Ok(())
        })
    }

    async fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), StorageError> {
        self.with_state(|state| {
            match state.sessions.get(&id) {
                Some(existing) if existing.user_id() == user_id => {}
                _ => return Err(StorageError::NotFound),
            }
            state.sessions.remove(&id);
            Ok(())
        })
    }

    async fn sum_pages_for_book(&self, book_id: BookId) -> Result<u64, StorageError> {
        self.with_state(|state| {
            Ok(state
                .sessions
                .values()
                .filter(|s| s.book_id() == book_id)
                .map(|s| u64::from(s.pages_read()))
                .sum())
        })
    }

    async fn sum_pages_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        self.with_state(|state| {
            Ok(state
                .sessions
                .values()
                .filter(|s| s.user_id() == user_id && s.started_at() >= since)
                .map(|s| u64::from(s.pages_read()))
                .sum())
        })
    }

    async fn daily_page_totals(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyTotal>, StorageError> {
        self.with_state(|state| {
            let mut by_day: std::collections::BTreeMap<NaiveDate, u32> =
                std::collections::BTreeMap::new();
            for session in state.sessions.values().filter(|s| {
                s.user_id() == user_id && s.started_on() >= from && s.started_on() <= until
            }) {
                *by_day.entry(session.started_on()).or_insert(0) += session.pages_read();
            }
            Ok(by_day
                .into_iter()
                .map(|(date, pages)| DailyTotal { date, pages })
                .collect())
        })
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn insert_goal(&self, goal: &ValidatedGoal) -> Result<GoalId, StorageError> {
        self.with_state(|state| {
            state.next_goal_id += 1;
            let id = GoalId::new(state.next_goal_id);
            state.goals.insert(id, goal.clone().assign_id(id));
            Ok(id)
        })
    }

    async fn get_goal(
        &self,
        user_id: UserId,
        id: GoalId,
    ) -> Result<Option<ReadingGoal>, StorageError> {
        self.with_state(|state| {
            Ok(state
                .goals
                .get(&id)
                .filter(|g| g.user_id() == user_id)
                .cloned())
        })
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<ReadingGoal>, StorageError> {
        self.with_state(|state| {
            let mut goals: Vec<ReadingGoal> = state
                .goals
                .values()
                .filter(|g| g.user_id() == user_id)
                .cloned()
                .collect();
            goals.sort_by(|a, b| {
                newest_first(
                    &(a.created_at(), a.id().value()),
                    &(b.created_at(), b.id().value()),
                )
            });
            Ok(goals)
        })
    }

    async fn active_goals(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReadingGoal>, StorageError> {
        let mut goals = self.list_goals(user_id).await?;
        goals.retain(|g| g.is_active(today));
        Ok(goals)
    }

    async fn update_goal(&self, goal: &ReadingGoal) -> Result<(), StorageError> {
        self.with_state(|state| {
            match state.goals.get(&goal.id()) {
                Some(existing) if existing.user_id() == goal.user_id() => {}
                _ => return Err(StorageError::NotFound),
            }
            state.goals.insert(goal.id(), goal.clone());
            Ok(())
        })
    }

    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), StorageError> {
        self.with_state(|state| {
            match state.goals.get(&id) {
                Some(existing) if existing.user_id() == user_id => {}
                _ => return Err(StorageError::NotFound),
            }
            state.goals.remove(&id);
            Ok(())
        })
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.with_state(|state| {
            state.profiles.insert(profile.user_id(), profile.clone());
            Ok(())
        })
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StorageError> {
        self.with_state(|state| Ok(state.profiles.get(&user_id).cloned()))
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the per-entity repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub books: Arc<dyn BookRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            books: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            goals: Arc::new(repo.clone()),
            profiles: Arc::new(repo),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
