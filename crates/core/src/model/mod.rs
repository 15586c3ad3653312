mod book;
mod goal;
mod ids;
mod image;
mod profile;
mod session;

pub use book::{Book, BookDraft, BookError, Genre, GenreCategory, Isbn, ReadingStatus, ValidatedBook};
pub use goal::{GoalDraft, GoalError, GoalType, ReadingGoal, ValidatedGoal, period_days};
pub use ids::{BookId, GoalId, ParseIdError, SessionId, UserId};
pub use image::{ImageRef, ImageRefError};
pub use profile::{MAX_BIO_LEN, ProfileError, UserProfile};
pub use session::{
    MAX_SESSION_DURATION, ReadingSession, SessionDraft, SessionError, ValidatedSession,
};
