use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{GoalId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("target pages must be > 0")]
    InvalidTargetPages,

    #[error("end date must be on or after start date")]
    EndBeforeStart,

    #[error("{goal_type:?} goals may span at most {max} days, got {days}")]
    PeriodTooLong {
        goal_type: GoalType,
        max: i64,
        days: i64,
    },

    #[error("unknown goal type code: {0}")]
    UnknownGoalType(String),
}

//
// ─── GOAL TYPE ─────────────────────────────────────────────────────────────────
//

/// Cadence of a reading goal.
///
/// The type bounds how long the goal's stored period may be; the period
/// itself is always the explicit `[start_date, end_date]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl GoalType {
    /// Maximum inclusive period length, in days, for this goal type.
    ///
    /// A Daily goal spans exactly one day (the minimum period is already
    /// one day since `end >= start`), a Weekly goal at most seven, and so
    /// on. Kept as a table so adding a cadence is a one-line change.
    #[must_use]
    pub fn max_period_days(self) -> i64 {
        match self {
            GoalType::Daily => 1,
            GoalType::Weekly => 7,
            GoalType::Monthly => 31,
            GoalType::Yearly => 366,
        }
    }

    /// One-letter storage code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            GoalType::Daily => "D",
            GoalType::Weekly => "W",
            GoalType::Monthly => "M",
            GoalType::Yearly => "Y",
        }
    }

    /// Parses a storage code back into a goal type.
    ///
    /// # Errors
    ///
    /// Returns `GoalError::UnknownGoalType` for anything but the four codes.
    pub fn from_code(code: &str) -> Result<Self, GoalError> {
        match code {
            "D" => Ok(GoalType::Daily),
            "W" => Ok(GoalType::Weekly),
            "M" => Ok(GoalType::Monthly),
            "Y" => Ok(GoalType::Yearly),
            other => Err(GoalError::UnknownGoalType(other.to_string())),
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            GoalType::Daily => "Daily",
            GoalType::Weekly => "Weekly",
            GoalType::Monthly => "Monthly",
            GoalType::Yearly => "Yearly",
        }
    }
}

//
// ─── READING GOAL ──────────────────────────────────────────────────────────────
//

/// Unvalidated input for creating or editing a reading goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub user_id: UserId,
    pub goal_type: GoalType,
    pub target_pages: u32,
    /// 0 means book completion is not tracked by this goal.
    pub target_books: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl GoalDraft {
    #[must_use]
    pub fn new(
        user_id: UserId,
        goal_type: GoalType,
        target_pages: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            goal_type,
            target_pages,
            target_books: 0,
            start_date,
            end_date,
        }
    }

    /// Checks the goal invariants and produces a goal awaiting an id.
    ///
    /// The period bound is enforced here, at the creation boundary only;
    /// progress computation never re-validates it.
    ///
    /// # Errors
    ///
    /// Returns a `GoalError` variant naming the violated invariant.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedGoal, GoalError> {
        if self.target_pages == 0 {
            return Err(GoalError::InvalidTargetPages);
        }
        if self.end_date < self.start_date {
            return Err(GoalError::EndBeforeStart);
        }
        let days = period_days(self.start_date, self.end_date);
        let max = self.goal_type.max_period_days();
        if days > max {
            return Err(GoalError::PeriodTooLong {
                goal_type: self.goal_type,
                max,
                days,
            });
        }

        Ok(ValidatedGoal {
            user_id: self.user_id,
            goal_type: self.goal_type,
            target_pages: self.target_pages,
            target_books: self.target_books,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: now,
        })
    }
}

/// Inclusive length of a goal period in days.
#[must_use]
pub fn period_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// A goal that passed validation but has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedGoal {
    pub user_id: UserId,
    pub goal_type: GoalType,
    pub target_pages: u32,
    pub target_books: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl ValidatedGoal {
    #[must_use]
    pub fn assign_id(self, id: GoalId) -> ReadingGoal {
        ReadingGoal {
            id,
            user_id: self.user_id,
            goal_type: self.goal_type,
            target_pages: self.target_pages,
            target_books: self.target_books,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        }
    }
}

/// A periodic reading target over an explicit date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingGoal {
    id: GoalId,
    user_id: UserId,
    goal_type: GoalType,
    target_pages: u32,
    target_books: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl ReadingGoal {
    /// Rehydrates a goal from persisted storage.
    ///
    /// Only the hard data invariants (`end >= start`, `target_pages > 0`)
    /// are re-checked; the per-type period bound is a creation-time policy
    /// and stored rows that predate a policy change still compute.
    ///
    /// # Errors
    ///
    /// Returns a `GoalError` if the stored row violates a data invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: GoalId,
        user_id: UserId,
        goal_type: GoalType,
        target_pages: u32,
        target_books: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        if target_pages == 0 {
            return Err(GoalError::InvalidTargetPages);
        }
        if end_date < start_date {
            return Err(GoalError::EndBeforeStart);
        }

        Ok(Self {
            id,
            user_id,
            goal_type,
            target_pages,
            target_books,
            start_date,
            end_date,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> GoalId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn goal_type(&self) -> GoalType {
        self.goal_type
    }

    #[must_use]
    pub fn target_pages(&self) -> u32 {
        self.target_pages
    }

    #[must_use]
    pub fn target_books(&self) -> u32 {
        self.target_books
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True if `today` falls within the goal period, inclusive on both ends.
    #[must_use]
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
