//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., SeaORM over PostgreSQL).
//! Every write goes through whatever transaction the repository was obtained
//! from; repositories never commit on their own.

use async_trait::async_trait;

use crate::domain::entities::{
    Repo, RepoFilter, RepoId, ResourceCounts, UserProfile, UserProfileFilter, UserProfileId, Vault,
    VaultFilter, VaultId, Workspace, WorkspaceFilter, WorkspaceId, WorkspaceType,
};
use crate::error::DomainError;

/// Generic CRUD contract shared by every repository
#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;
    type Id: Send + Sync;
    type Filter: Send + Sync;

    /// Find an entity by ID
    async fn get(&self, id: &Self::Id) -> Result<Option<Self::Entity>, DomainError>;

    /// Insert the entity if its ID is new, otherwise replace the stored row.
    /// `created_at` of an existing row is never overwritten.
    async fn save(&self, entity: &Self::Entity) -> Result<Self::Entity, DomainError>;

    /// Delete an entity; `NotFound` if there is nothing to delete
    async fn delete(&self, id: &Self::Id) -> Result<(), DomainError>;

    /// Check whether an entity with this ID exists
    async fn exists(&self, id: &Self::Id) -> Result<bool, DomainError>;

    /// List entities matching the filter, oldest first
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Entity>, DomainError>;
}

/// Repository for UserProfile entities
#[async_trait]
pub trait UserProfileRepository:
    Repository<Entity = UserProfile, Id = UserProfileId, Filter = UserProfileFilter>
{
    /// Find a profile by username (case-sensitive)
    async fn get_by_username(&self, username: &str) -> Result<Option<UserProfile>, DomainError>;

    /// Find a profile by email
    async fn get_by_email(&self, email: &str) -> Result<Option<UserProfile>, DomainError>;

    /// Check if a username is taken, optionally ignoring one profile
    async fn exists_by_username(
        &self,
        username: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError>;

    /// Check if an email is taken, optionally ignoring one profile
    async fn exists_by_email(
        &self,
        email: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError>;

    /// Count the workspaces owned by a user
    async fn count_workspaces(&self, user_id: &UserProfileId) -> Result<u64, DomainError>;
}

/// Repository for Workspace entities
#[async_trait]
pub trait WorkspaceRepository:
    Repository<Entity = Workspace, Id = WorkspaceId, Filter = WorkspaceFilter>
{
    /// Find a user's workspace by name
    async fn get_by_user_and_name(
        &self,
        user_id: &UserProfileId,
        name: &str,
    ) -> Result<Option<Workspace>, DomainError>;

    /// All workspaces owned by a user
    async fn list_by_user(&self, user_id: &UserProfileId) -> Result<Vec<Workspace>, DomainError>;

    /// A user's workspaces of one type
    async fn list_by_user_and_type(
        &self,
        user_id: &UserProfileId,
        workspace_type: WorkspaceType,
    ) -> Result<Vec<Workspace>, DomainError>;

    /// Count repos and vaults held by a workspace
    async fn count_resources(&self, workspace_id: &WorkspaceId)
        -> Result<ResourceCounts, DomainError>;
}

/// Repository for Repo entities
#[async_trait]
pub trait RepoRepository: Repository<Entity = Repo, Id = RepoId, Filter = RepoFilter> {
    /// All repos in a workspace
    async fn list_by_workspace(&self, workspace_id: &WorkspaceId)
        -> Result<Vec<Repo>, DomainError>;

    /// Find a repo by name within a workspace
    async fn get_by_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Repo>, DomainError>;

    /// Count repos in a workspace
    async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError>;

    /// Delete every repo in a workspace, returning how many went
    async fn delete_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError>;
}

/// Repository for Vault entities
#[async_trait]
pub trait VaultRepository: Repository<Entity = Vault, Id = VaultId, Filter = VaultFilter> {
    /// All vaults in a workspace
    async fn list_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Vault>, DomainError>;

    /// Find a vault by name within a workspace
    async fn get_by_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Vault>, DomainError>;

    /// Count vaults in a workspace
    async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError>;

    /// Set the lock flag. This is the only write that changes `is_locked`;
    /// `save` leaves it untouched on existing rows.
    async fn set_locked(&self, id: &VaultId, locked: bool) -> Result<Vault, DomainError>;
}
