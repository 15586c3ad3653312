//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use tracker_core::model::{BookError, GoalError, ProfileError, SessionError};

/// Errors emitted by `BookService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BookServiceError {
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Book(#[from] BookError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error("session not found")]
    NotFound,
    #[error("book not found for session")]
    UnknownBook,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `GoalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalServiceError {
    #[error("goal not found")]
    NotFound,
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DashboardService` queries that do not degrade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
