//! UserProfile domain entity
//!
//! The global identity anchor. A profile is referenced by workspaces but does
//! not own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::now;
use crate::error::DomainError;

/// Free-form user preferences (a JSON object)
pub type Preferences = Map<String, Value>;

/// Unique identifier for a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserProfileId(pub Uuid);

impl UserProfileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserProfileId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: UserProfileId,
    pub username: String,
    pub email: String,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build a new profile, rejecting invalid usernames and emails
    pub fn new(new: NewUserProfile) -> Result<Self, DomainError> {
        let ts = now();
        let profile = UserProfile {
            id: UserProfileId::new(),
            username: new.username,
            email: new.email,
            preferences: new.preferences,
            created_at: ts,
            updated_at: ts,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check every field rule
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.validate_username() {
            return Err(DomainError::Validation(format!(
                "Invalid username '{}': must be at least 3 alphanumeric characters",
                self.username
            )));
        }
        if !self.validate_email() {
            return Err(DomainError::Validation(format!(
                "Invalid email '{}'",
                self.email
            )));
        }
        Ok(())
    }

    /// True iff the username has at least 3 characters, all alphanumeric
    pub fn validate_username(&self) -> bool {
        is_valid_username(&self.username)
    }

    pub fn validate_email(&self) -> bool {
        is_valid_email(&self.email)
    }

    /// Whether one more workspace fits under `max_workspaces`
    pub fn can_create_workspace(&self, current_workspace_count: u64, max_workspaces: u64) -> bool {
        current_workspace_count < max_workspaces
    }

    /// Merge preferences: new keys overwrite, other keys are kept
    pub fn update_preferences(&mut self, preferences: Preferences) {
        self.preferences.extend(preferences);
        self.updated_at = now();
    }

    /// Change the email address; the profile is untouched if it is invalid
    pub fn update_email(&mut self, email: &str) -> Result<(), DomainError> {
        if !is_valid_email(email) {
            return Err(DomainError::Validation(format!("Invalid email '{}'", email)));
        }
        self.email = email.to_string();
        self.updated_at = now();
        Ok(())
    }
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    username.chars().count() >= 3 && username.chars().all(char::is_alphanumeric)
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && !domain.contains('@') && domain.contains('.')
}

/// Data needed to create a new user profile
#[derive(Debug, Clone, Default)]
pub struct NewUserProfile {
    pub username: String,
    pub email: String,
    pub preferences: Preferences,
}

impl NewUserProfile {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            preferences: Preferences::new(),
        }
    }
}

/// Partial update of a profile; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct UserProfileUpdate {
    pub email: Option<String>,
    /// Merged into the existing preferences
    pub preferences: Option<Preferences>,
}

/// Filter for listing profiles
#[derive(Debug, Clone, Default)]
pub struct UserProfileFilter {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
