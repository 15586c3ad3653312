use sqlx::Row;
use uuid::Uuid;

use tracker_core::model::{
    Book, BookId, Genre, GoalId, GoalType, ImageRef, Isbn, ReadingGoal, ReadingSession,
    ReadingStatus, SessionId, UserId, UserProfile,
};

use crate::repository::StorageError;

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn id_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn book_id_from_i64(v: i64) -> Result<BookId, StorageError> {
    id_u64("book_id", v).map(BookId::new)
}

pub(super) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    id_u64("session_id", v).map(SessionId::new)
}

pub(super) fn goal_id_from_i64(v: i64) -> Result<GoalId, StorageError> {
    id_u64("goal_id", v).map(GoalId::new)
}

/// User ids are persisted as canonical UUID text so rows stay greppable.
pub(super) fn user_id_from_text(raw: &str) -> Result<UserId, StorageError> {
    Uuid::parse_str(raw)
        .map(UserId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid user_id: {raw}")))
}

pub(super) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn map_book_row(row: &sqlx::sqlite::SqliteRow) -> Result<Book, StorageError> {
    let id = book_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let author: String = row.try_get("author").map_err(ser)?;
    let isbn = row
        .try_get::<Option<String>, _>("isbn")
        .map_err(ser)?
        .map(|raw| Isbn::new(raw).map_err(ser))
        .transpose()?;
    let total_pages = u32_from_i64(
        "total_pages",
        row.try_get::<i64, _>("total_pages").map_err(ser)?,
    )?;
    let genre = Genre::from_code(&row.try_get::<String, _>("genre").map_err(ser)?).map_err(ser)?;
    let status =
        ReadingStatus::from_code(&row.try_get::<String, _>("status").map_err(ser)?).map_err(ser)?;
    let cover = row
        .try_get::<Option<String>, _>("cover")
        .map_err(ser)?
        .map(|raw| ImageRef::parse(&raw).map_err(ser))
        .transpose()?;
    let created_at = row.try_get("created_at").map_err(ser)?;
    let updated_at = row.try_get("updated_at").map_err(ser)?;

    Book::from_persisted(
        id,
        user_id,
        title,
        author,
        isbn,
        total_pages,
        genre,
        status,
        cover,
        created_at,
        updated_at,
    )
    .map_err(ser)
}

pub(super) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ReadingSession, StorageError> {
    let id = session_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let book_id = book_id_from_i64(row.try_get::<i64, _>("book_id").map_err(ser)?)?;
    let pages_read = u32_from_i64(
        "pages_read",
        row.try_get::<i64, _>("pages_read").map_err(ser)?,
    )?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let ended_at = row.try_get("ended_at").map_err(ser)?;
    let notes: String = row.try_get("notes").map_err(ser)?;
    let created_at = row.try_get("created_at").map_err(ser)?;

    ReadingSession::from_persisted(
        id, user_id, book_id, pages_read, started_at, ended_at, notes, created_at,
    )
    .map_err(ser)
}

pub(super) fn map_goal_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReadingGoal, StorageError> {
    let id = goal_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let goal_type =
        GoalType::from_code(&row.try_get::<String, _>("goal_type").map_err(ser)?).map_err(ser)?;
    let target_pages = u32_from_i64(
        "target_pages",
        row.try_get::<i64, _>("target_pages").map_err(ser)?,
    )?;
    let target_books = u32_from_i64(
        "target_books",
        row.try_get::<i64, _>("target_books").map_err(ser)?,
    )?;
    let start_date = row.try_get("start_date").map_err(ser)?;
    let end_date = row.try_get("end_date").map_err(ser)?;
    let created_at = row.try_get("created_at").map_err(ser)?;

    ReadingGoal::from_persisted(
        id,
        user_id,
        goal_type,
        target_pages,
        target_books,
        start_date,
        end_date,
        created_at,
    )
    .map_err(ser)
}

pub(super) fn map_profile_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, StorageError> {
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let is_public: bool = row.try_get("is_public").map_err(ser)?;
    let bio: String = row.try_get("bio").map_err(ser)?;
    let picture = row
        .try_get::<Option<String>, _>("picture")
        .map_err(ser)?
        .map(|raw| ImageRef::parse(&raw).map_err(ser))
        .transpose()?;
    let updated_at = row.try_get("updated_at").map_err(ser)?;

    UserProfile::new(user_id, is_public, bio, picture, updated_at).map_err(ser)
}
