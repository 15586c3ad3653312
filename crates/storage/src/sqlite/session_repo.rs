use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

use tracker_core::model::{BookId, ReadingSession, SessionId, UserId, ValidatedSession};
use tracker_core::streaks::DailyTotal;

use super::SqliteRepository;
use super::mapping::{id_i64, map_session_row, ser, u32_from_i64};
use crate::repository::{SessionRepository, StorageError};

const SESSION_COLUMNS: &str =
    "id, user_id, book_id, pages_read, started_at, ended_at, notes, created_at";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn sum_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<u64, StorageError> {
    let total: i64 = row.try_get("total").map_err(ser)?;
    u64::try_from(total).map_err(|_| StorageError::Serialization(format!("invalid sum: {total}")))
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, session: &ValidatedSession) -> Result<SessionId, StorageError> {
        // started_on is the denormalized date bucket every window query keys on.
        let res = sqlx::query(
            r"
                INSERT INTO reading_sessions (
                    user_id, book_id, pages_read, started_at, ended_at,
                    started_on, notes, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(session.user_id.value().to_string())
        .bind(id_i64("book_id", session.book_id.value())?)
        .bind(i64::from(session.pages_read))
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.started_at.date_naive())
        .bind(&session.notes)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        u64::try_from(res.last_insert_rowid())
            .map(SessionId::new)
            .map_err(|_| StorageError::Serialization("negative rowid".into()))
    }

    async fn get_session(
        &self,
        user_id: UserId,
        id: SessionId,
    ) -> Result<Option<ReadingSession>, StorageError> {
        let sql =
            format!("SELECT {SESSION_COLUMNS} FROM reading_sessions WHERE id = ?1 AND user_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_i64("session_id", id.value())?)
            .bind(user_id.value().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|r| map_session_row(&r)).transpose()
    }

    async fn list_sessions_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<ReadingSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM reading_sessions WHERE book_id = ?1
             ORDER BY started_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("book_id", book_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn list_sessions_in_window(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ReadingSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM reading_sessions
             WHERE user_id = ?1 AND started_on >= ?2 AND started_on <= ?3
             ORDER BY started_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn update_session(&self, session: &ReadingSession) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE reading_sessions
                SET book_id = ?1, pages_read = ?2, started_at = ?3, ended_at = ?4,
                    started_on = ?5, notes = ?6
                WHERE id = ?7 AND user_id = ?8
            ",
        )
        .bind(id_i64("book_id", session.book_id().value())?)
        .bind(i64::from(session.pages_read()))
        .bind(session.started_at())
        .bind(session.ended_at())
        .bind(session.started_on())
        .bind(session.notes())
        .bind(id_i64("session_id", session.id().value())?)
        .bind(session.user_id().value().to_string())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM reading_sessions WHERE id = ?1 AND user_id = ?2")
            .bind(id_i64("session_id", id.value())?)
            .bind(user_id.value().to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn sum_pages_for_book(&self, book_id: BookId) -> Result<u64, StorageError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(pages_read), 0) AS total
             FROM reading_sessions WHERE book_id = ?1",
        )
        .bind(id_i64("book_id", book_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        sum_from_row(&row)
    }

    async fn sum_pages_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(pages_read), 0) AS total
             FROM reading_sessions WHERE user_id = ?1 AND started_at >= ?2",
        )
        .bind(user_id.value().to_string())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        sum_from_row(&row)
    }

    async fn daily_page_totals(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyTotal>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT started_on, SUM(pages_read) AS pages
                FROM reading_sessions
                WHERE user_id = ?1 AND started_on >= ?2 AND started_on <= ?3
                GROUP BY started_on
                ORDER BY started_on ASC
            ",
        )
        .bind(user_id.value().to_string())
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let date: NaiveDate = row.try_get("started_on").map_err(ser)?;
            let pages = u32_from_i64("pages", row.try_get::<i64, _>("pages").map_err(ser)?)?;
            out.push(DailyTotal { date, pages });
        }
        Ok(out)
    }
}
