use chrono::NaiveDate;

use tracker_core::model::{GoalId, ReadingGoal, UserId, ValidatedGoal};

use super::SqliteRepository;
use super::mapping::{id_i64, map_goal_row};
use crate::repository::{GoalRepository, StorageError};

const GOAL_COLUMNS: &str =
    "id, user_id, goal_type, target_pages, target_books, start_date, end_date, created_at";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl GoalRepository for SqliteRepository {
    async fn insert_goal(&self, goal: &ValidatedGoal) -> Result<GoalId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO reading_goals (
                    user_id, goal_type, target_pages, target_books,
                    start_date, end_date, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(goal.user_id.value().to_string())
        .bind(goal.goal_type.code())
        .bind(i64::from(goal.target_pages))
        .bind(i64::from(goal.target_books))
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        u64::try_from(res.last_insert_rowid())
            .map(GoalId::new)
            .map_err(|_| StorageError::Serialization("negative rowid".into()))
    }

    async fn get_goal(
        &self,
        user_id: UserId,
        id: GoalId,
    ) -> Result<Option<ReadingGoal>, StorageError> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM reading_goals WHERE id = ?1 AND user_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_i64("goal_id", id.value())?)
            .bind(user_id.value().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|r| map_goal_row(&r)).transpose()
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<ReadingGoal>, StorageError> {
        let sql = format!(
            "SELECT {GOAL_COLUMNS} FROM reading_goals WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_goal_row).collect()
    }

    async fn active_goals(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReadingGoal>, StorageError> {
        let sql = format!(
            "SELECT {GOAL_COLUMNS} FROM reading_goals
             WHERE user_id = ?1 AND start_date <= ?2 AND end_date >= ?2
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.value().to_string())
            .bind(today)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_goal_row).collect()
    }

    async fn update_goal(&self, goal: &ReadingGoal) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE reading_goals
                SET goal_type = ?1, target_pages = ?2, target_books = ?3,
                    start_date = ?4, end_date = ?5
                WHERE id = ?6 AND user_id = ?7
            ",
        )
        .bind(goal.goal_type().code())
        .bind(i64::from(goal.target_pages()))
        .bind(i64::from(goal.target_books()))
        .bind(goal.start_date())
        .bind(goal.end_date())
        .bind(id_i64("goal_id", goal.id().value())?)
        .bind(goal.user_id().value().to_string())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM reading_goals WHERE id = ?1 AND user_id = ?2")
            .bind(id_i64("goal_id", id.value())?)
            .bind(user_id.value().to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
