//! User profile service
//!
//! Handles profile registration, lookup and profile edits. Usernames and
//! emails are unique across all users.

use std::sync::Arc;

use crate::app::ResourceLimits;
use crate::domain::entities::{
    NewUserProfile, Preferences, UserProfile, UserProfileId, UserProfileUpdate,
};
use crate::domain::ports::{Repository, UnitOfWork, UnitOfWorkFactory, UserProfileRepository};
use crate::error::DomainError;

/// Service for managing user profiles
pub struct UserProfileService<F>
where
    F: UnitOfWorkFactory,
{
    uow: Arc<F>,
    limits: ResourceLimits,
}

impl<F> UserProfileService<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(uow: Arc<F>, limits: ResourceLimits) -> Self {
        Self { uow, limits }
    }

    /// Register a new user
    ///
    /// A username or email that is already taken yields `AlreadyExists`,
    /// whether the check catches it or the unique constraint does.
    pub async fn create(&self, new: NewUserProfile) -> Result<UserProfile, DomainError> {
        let profile = UserProfile::new(new)?;
        let mut uow = self.uow.begin().await?;

        if uow
            .user_profiles()
            .exists_by_username(&profile.username, None)
            .await?
        {
            return Err(DomainError::AlreadyExists(format!(
                "UserProfile with username '{}' already exists",
                profile.username
            )));
        }
        if uow
            .user_profiles()
            .exists_by_email(&profile.email, None)
            .await?
        {
            return Err(DomainError::AlreadyExists(format!(
                "UserProfile with email '{}' already exists",
                profile.email
            )));
        }

        let saved = uow
            .user_profiles()
            .save(&profile)
            .await
            .map_err(DomainError::conflict_as_already_exists)?;
        uow.commit()
            .await
            .map_err(DomainError::conflict_as_already_exists)?;

        tracing::info!(user_id = %saved.id, username = %saved.username, "Created user profile");
        Ok(saved)
    }

    pub async fn get(&self, id: &UserProfileId) -> Result<UserProfile, DomainError> {
        let uow = self.uow.begin().await?;
        let profile = uow.user_profiles().get(id).await?;
        profile.ok_or_else(|| DomainError::NotFound(format!("UserProfile {}", id)))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserProfile, DomainError> {
        let uow = self.uow.begin().await?;
        let profile = uow.user_profiles().get_by_username(username).await?;
        profile.ok_or_else(|| {
            DomainError::NotFound(format!("UserProfile with username '{}'", username))
        })
    }

    pub async fn get_by_email(&self, email: &str) -> Result<UserProfile, DomainError> {
        let uow = self.uow.begin().await?;
        let profile = uow.user_profiles().get_by_email(email).await?;
        profile.ok_or_else(|| DomainError::NotFound(format!("UserProfile with email '{}'", email)))
    }

    /// Change email and/or merge preferences
    pub async fn update(
        &self,
        id: &UserProfileId,
        update: UserProfileUpdate,
    ) -> Result<UserProfile, DomainError> {
        let mut uow = self.uow.begin().await?;
        let mut profile = load(&uow, id).await?;

        if let Some(email) = update.email {
            if uow.user_profiles().exists_by_email(&email, Some(id)).await? {
                return Err(DomainError::AlreadyExists(format!(
                    "UserProfile with email '{}' already exists",
                    email
                )));
            }
            profile.update_email(&email)?;
        }
        if let Some(preferences) = update.preferences {
            profile.update_preferences(preferences);
        }

        let saved = uow
            .user_profiles()
            .save(&profile)
            .await
            .map_err(DomainError::conflict_as_already_exists)?;
        uow.commit()
            .await
            .map_err(DomainError::conflict_as_already_exists)?;

        tracing::info!(user_id = %saved.id, "Updated user profile");
        Ok(saved)
    }

    /// Merge `preferences` into the stored ones; existing keys are overwritten
    pub async fn update_preferences(
        &self,
        id: &UserProfileId,
        preferences: Preferences,
    ) -> Result<UserProfile, DomainError> {
        self.update(
            id,
            UserProfileUpdate {
                preferences: Some(preferences),
                ..Default::default()
            },
        )
        .await
    }

    /// Whether the user is still below the workspace limit
    pub async fn can_create_workspace(&self, id: &UserProfileId) -> Result<bool, DomainError> {
        let uow = self.uow.begin().await?;
        let profile = load(&uow, id).await?;
        let count = uow.user_profiles().count_workspaces(id).await?;

        Ok(profile.can_create_workspace(count, self.limits.max_workspaces_per_user))
    }

    /// Fail with `LimitExceeded` once the user owns the maximum number of workspaces
    pub async fn check_workspace_limit(&self, id: &UserProfileId) -> Result<(), DomainError> {
        if !self.can_create_workspace(id).await? {
            return Err(DomainError::LimitExceeded(format!(
                "User {} already owns the maximum of {} workspaces",
                id, self.limits.max_workspaces_per_user
            )));
        }
        Ok(())
    }
}

async fn load<U: UnitOfWork>(uow: &U, id: &UserProfileId) -> Result<UserProfile, DomainError> {
    uow.user_profiles()
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("UserProfile {}", id)))
}
