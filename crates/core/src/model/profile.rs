use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::image::ImageRef;

/// Longest bio the profile page renders without truncation.
pub const MAX_BIO_LEN: usize = 500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("bio cannot exceed {MAX_BIO_LEN} characters, got {0}")]
    BioTooLong(usize),
}

/// Per-user profile settings; one row per account.
///
/// Not involved in any computation — carried for completeness of the data
/// model (visibility, bio, picture).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    user_id: UserId,
    is_public: bool,
    bio: String,
    picture: Option<ImageRef>,
    updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a profile, trimming the bio and enforcing its length cap.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::BioTooLong` past [`MAX_BIO_LEN`] characters.
    pub fn new(
        user_id: UserId,
        is_public: bool,
        bio: impl Into<String>,
        picture: Option<ImageRef>,
        now: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        let bio = bio.into().trim().to_owned();
        let len = bio.chars().count();
        if len > MAX_BIO_LEN {
            return Err(ProfileError::BioTooLong(len));
        }

        Ok(Self {
            user_id,
            is_public,
            bio,
            picture,
            updated_at: now,
        })
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    #[must_use]
    pub fn bio(&self) -> &str {
        &self.bio
    }

    #[must_use]
    pub fn picture(&self) -> Option<&ImageRef> {
        self.picture.as_ref()
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    #[test]
    fn bio_is_trimmed_and_capped() {
        let user = UserId::new(Uuid::from_u128(5));
        let profile =
            UserProfile::new(user, true, "  reads a lot  ", None, fixed_now()).unwrap();
        assert_eq!(profile.bio(), "reads a lot");
        assert!(profile.is_public());

        let long = "x".repeat(MAX_BIO_LEN + 1);
        let err = UserProfile::new(user, false, long, None, fixed_now()).unwrap_err();
        assert_eq!(err, ProfileError::BioTooLong(MAX_BIO_LEN + 1));
    }

    #[test]
    fn exact_cap_is_accepted() {
        let user = UserId::new(Uuid::from_u128(5));
        let bio = "y".repeat(MAX_BIO_LEN);
        assert!(UserProfile::new(user, false, bio, None, fixed_now()).is_ok());
    }
}
