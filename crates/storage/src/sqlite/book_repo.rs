use chrono::NaiveDate;
use sqlx::Row;

use tracker_core::model::{Book, BookId, Genre, ReadingStatus, UserId, ValidatedBook};

use super::SqliteRepository;
use super::mapping::{id_i64, map_book_row, ser, u32_from_i64};
use crate::repository::{BookRepository, GenreCount, StorageError};

const BOOK_COLUMNS: &str =
    "id, user_id, title, author, isbn, total_pages, genre, status, cover, created_at, updated_at";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl BookRepository for SqliteRepository {
    async fn insert_book(&self, book: &ValidatedBook) -> Result<BookId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO books (
                    user_id, title, author, isbn, total_pages,
                    genre, status, cover, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ",
        )
        .bind(book.user_id.value().to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.as_ref().map(|i| i.as_str().to_owned()))
        .bind(i64::from(book.total_pages))
        .bind(book.genre.code())
        .bind(book.status.code())
        .bind(book.cover.as_ref().map(tracker_core::model::ImageRef::to_persisted))
        .bind(book.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        u64::try_from(res.last_insert_rowid())
            .map(BookId::new)
            .map_err(|_| StorageError::Serialization("negative rowid".into()))
    }

    async fn get_book(&self, user_id: UserId, id: BookId) -> Result<Option<Book>, StorageError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1 AND user_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_i64("book_id", id.value())?)
            .bind(user_id.value().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|r| map_book_row(&r)).transpose()
    }

    async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, StorageError> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_book_row).collect()
    }

    async fn list_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<Vec<Book>, StorageError> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = ?1 AND status = ?2
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .bind(status.code())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_book_row).collect()
    }

    async fn update_book(&self, book: &Book) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE books
                SET title = ?1, author = ?2, isbn = ?3, total_pages = ?4,
                    genre = ?5, status = ?6, cover = ?7, updated_at = ?8
                WHERE id = ?9 AND user_id = ?10
            ",
        )
        .bind(book.title())
        .bind(book.author())
        .bind(book.isbn().map(|i| i.as_str().to_owned()))
        .bind(i64::from(book.total_pages()))
        .bind(book.genre().code())
        .bind(book.status().code())
        .bind(book.cover().map(tracker_core::model::ImageRef::to_persisted))
        .bind(book.updated_at())
        .bind(id_i64("book_id", book.id().value())?)
        .bind(book.user_id().value().to_string())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_book(&self, user_id: UserId, id: BookId) -> Result<(), StorageError> {
        // ON DELETE CASCADE removes the book's sessions.
        let res = sqlx::query("DELETE FROM books WHERE id = ?1 AND user_id = ?2")
            .bind(id_i64("book_id", id.value())?)
            .bind(user_id.value().to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn count_books(&self, user_id: UserId) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM books WHERE user_id = ?1")
            .bind(user_id.value().to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization(format!("invalid count: {n}")))
    }

    async fn count_books_by_status(
        &self,
        user_id: UserId,
        status: ReadingStatus,
    ) -> Result<u64, StorageError> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM books WHERE user_id = ?1 AND status = ?2")
                .bind(user_id.value().to_string())
                .bind(status.code())
                .fetch_one(&self.pool)
                .await
                .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization(format!("invalid count: {n}")))
    }

    async fn genre_distribution(&self, user_id: UserId) -> Result<Vec<GenreCount>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT genre, COUNT(*) AS n
                FROM books
                WHERE user_id = ?1
                GROUP BY genre
                ORDER BY n DESC, genre ASC
            ",
        )
        .bind(user_id.value().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let genre =
                Genre::from_code(&row.try_get::<String, _>("genre").map_err(ser)?).map_err(ser)?;
            let count = u32_from_i64("count", row.try_get::<i64, _>("n").map_err(ser)?)?;
            out.push(GenreCount {
                genre,
                count: u64::from(count),
            });
        }
        Ok(out)
    }

    async fn completed_books_in_window(
        &self,
        user_id: UserId,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Book>, StorageError> {
        let sql = format!(
            "SELECT DISTINCT b.id AS id, b.user_id AS user_id, b.title AS title,
                    b.author AS author, b.isbn AS isbn, b.total_pages AS total_pages,
                    b.genre AS genre, b.status AS status, b.cover AS cover,
                    b.created_at AS created_at, b.updated_at AS updated_at
             FROM books b
             JOIN reading_sessions s ON s.book_id = b.id
             WHERE b.user_id = ?1 AND b.status = '{}'
               AND s.started_on >= ?2 AND s.started_on <= ?3
             ORDER BY b.created_at DESC, b.id DESC",
            ReadingStatus::Completed.code()
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_book_row).collect()
    }
}
