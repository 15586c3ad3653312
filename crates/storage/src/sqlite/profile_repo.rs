use tracker_core::model::{ImageRef, UserId, UserProfile};

use super::SqliteRepository;
use super::mapping::map_profile_row;
use crate::repository::{ProfileRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO user_profiles (user_id, is_public, bio, picture, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(user_id) DO UPDATE SET
                    is_public = excluded.is_public,
                    bio = excluded.bio,
                    picture = excluded.picture,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(profile.user_id().value().to_string())
        .bind(profile.is_public())
        .bind(profile.bio())
        .bind(profile.picture().map(ImageRef::to_persisted))
        .bind(profile.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            "SELECT user_id, is_public, bio, picture, updated_at
             FROM user_profiles WHERE user_id = ?1",
        )
        .bind(user_id.value().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|r| map_profile_row(&r)).transpose()
    }
}
