use std::sync::Arc;

use storage::repository::ProfileRepository;
use tracker_core::model::{ImageRef, UserId, UserProfile};

use crate::Clock;
use crate::error::ProfileServiceError;

/// Thin orchestration over the one-row-per-user profile.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { clock, profiles }
    }

    /// The owner's profile, or a fresh private default if none was saved
    /// yet (registration creates profiles lazily).
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on repository failures.
    pub async fn get_or_default(&self, user_id: UserId) -> Result<UserProfile, ProfileServiceError> {
        if let Some(profile) = self.profiles.get_profile(user_id).await? {
            return Ok(profile);
        }
        let profile = UserProfile::new(user_id, false, "", None, self.clock.now())?;
        Ok(profile)
    }

    /// Validate and persist the owner's profile settings.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Profile` for validation failures and
    /// `ProfileServiceError::Storage` if persistence fails.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        is_public: bool,
        bio: impl Into<String>,
        picture: Option<ImageRef>,
    ) -> Result<UserProfile, ProfileServiceError> {
        let profile = UserProfile::new(user_id, is_public, bio, picture, self.clock.now())?;
        self.profiles.upsert_profile(&profile).await?;
        Ok(profile)
    }
}
