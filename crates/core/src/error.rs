use thiserror::Error;

use crate::model::{BookError, GoalError, ImageRefError, ProfileError, SessionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Book(#[from] BookError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Image(#[from] ImageRefError),
}
