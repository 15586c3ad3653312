#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    BookRepository, GenreCount, GoalRepository, InMemoryRepository, ProfileRepository,
    SessionRepository, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
