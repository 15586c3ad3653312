use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::model::ids::{BookId, SessionId, UserId};

/// Upper bound on a single sitting; longer entries are almost certainly a
/// typo in the timestamps and are rejected outright, never clamped.
pub const MAX_SESSION_DURATION: Duration = Duration::hours(24);

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("pages read must be > 0")]
    InvalidPagesRead,

    #[error("end time must be after start time")]
    EndNotAfterStart,

    #[error("session duration cannot exceed 24 hours")]
    DurationTooLong,
}

//
// ─── READING SESSION ───────────────────────────────────────────────────────────
//

/// Unvalidated input for logging or editing a reading session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub user_id: UserId,
    pub book_id: BookId,
    pub pages_read: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub notes: String,
}

impl SessionDraft {
    #[must_use]
    pub fn new(
        user_id: UserId,
        book_id: BookId,
        pages_read: u32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            book_id,
            pages_read,
            started_at,
            ended_at,
            notes: String::new(),
        }
    }

    /// Checks the session invariants and produces a session awaiting an id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPagesRead` for zero pages,
    /// `SessionError::EndNotAfterStart` unless the end is strictly after
    /// the start, and `SessionError::DurationTooLong` past 24 hours.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedSession, SessionError> {
        if self.pages_read == 0 {
            return Err(SessionError::InvalidPagesRead);
        }
        if self.ended_at <= self.started_at {
            return Err(SessionError::EndNotAfterStart);
        }
        if self.ended_at - self.started_at > MAX_SESSION_DURATION {
            return Err(SessionError::DurationTooLong);
        }

        Ok(ValidatedSession {
            user_id: self.user_id,
            book_id: self.book_id,
            pages_read: self.pages_read,
            started_at: self.started_at,
            ended_at: self.ended_at,
            notes: self.notes,
            created_at: now,
        })
    }
}

/// A session that passed validation but has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    pub user_id: UserId,
    pub book_id: BookId,
    pub pages_read: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl ValidatedSession {
    #[must_use]
    pub fn assign_id(self, id: SessionId) -> ReadingSession {
        ReadingSession {
            id,
            user_id: self.user_id,
            book_id: self.book_id,
            pages_read: self.pages_read,
            started_at: self.started_at,
            ended_at: self.ended_at,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

/// One logged sitting with a book.
///
/// Overlapping or duplicate time ranges for the same book are accepted;
/// totals simply sum everything logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSession {
    id: SessionId,
    user_id: UserId,
    book_id: BookId,
    pages_read: u32,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    notes: String,
    created_at: DateTime<Utc>,
}

impl ReadingSession {
    /// Rehydrates a session from persisted storage, re-checking invariants.
    ///
    /// # Errors
    ///
    /// Returns a `SessionError` if the stored fields violate the domain
    /// invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        book_id: BookId,
        pages_read: u32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        notes: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if pages_read == 0 {
            return Err(SessionError::InvalidPagesRead);
        }
        if ended_at <= started_at {
            return Err(SessionError::EndNotAfterStart);
        }
        if ended_at - started_at > MAX_SESSION_DURATION {
            return Err(SessionError::DurationTooLong);
        }

        Ok(Self {
            id,
            user_id,
            book_id,
            pages_read,
            started_at,
            ended_at,
            notes,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    #[must_use]
    pub fn pages_read(&self) -> u32 {
        self.pages_read
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Length of the sitting.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.ended_at - self.started_at
    }

    /// The UTC calendar date the session started on.
    ///
    /// Goal windows and daily activity buckets key off this date.
    #[must_use]
    pub fn started_on(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    fn draft(pages: u32, minutes: i64) -> SessionDraft {
        let start = fixed_now();
        SessionDraft::new(
            UserId::new(Uuid::from_u128(1)),
            BookId::new(1),
            pages,
            start,
            start + Duration::minutes(minutes),
        )
    }

    #[test]
    fn draft_rejects_zero_pages() {
        assert_eq!(
            draft(0, 30).validate(fixed_now()).unwrap_err(),
            SessionError::InvalidPagesRead
        );
    }

    #[test]
    fn draft_rejects_end_at_or_before_start() {
        assert_eq!(
            draft(10, 0).validate(fixed_now()).unwrap_err(),
            SessionError::EndNotAfterStart
        );
        assert_eq!(
            draft(10, -5).validate(fixed_now()).unwrap_err(),
            SessionError::EndNotAfterStart
        );
    }

    #[test]
    fn draft_rejects_over_24_hours() {
        let err = draft(10, 24 * 60 + 1).validate(fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::DurationTooLong);
    }

    #[test]
    fn exactly_24_hours_is_accepted() {
        let session = draft(10, 24 * 60)
            .validate(fixed_now())
            .unwrap()
            .assign_id(SessionId::new(1));
        assert_eq!(session.duration(), Duration::hours(24));
    }

    #[test]
    fn duration_and_start_date_are_exposed() {
        let session = draft(25, 45)
            .validate(fixed_now())
            .unwrap()
            .assign_id(SessionId::new(3));
        assert_eq!(session.duration(), Duration::minutes(45));
        assert_eq!(session.started_on(), fixed_now().date_naive());
        assert_eq!(session.pages_read(), 25);
    }
}
