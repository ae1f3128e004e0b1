//! Workspace service
//!
//! Workspaces belong to exactly one user and hold that user's repos and
//! vaults. Names are unique per owner.

use std::sync::Arc;

use uuid::Uuid;

use crate::app::access::{ensure_owner, owned_workspace};
use crate::app::ResourceLimits;
use crate::domain::entities::{
    NewWorkspace, ResourceCounts, UserProfileId, Workspace, WorkspaceId, WorkspaceType,
    WorkspaceUpdate,
};
use crate::domain::ports::{
    RepoRepository, Repository, UnitOfWork, UnitOfWorkFactory, UserProfileRepository,
    VaultRepository, WorkspaceRepository,
};
use crate::error::DomainError;

/// Service for managing workspaces
pub struct WorkspaceService<F>
where
    F: UnitOfWorkFactory,
{
    uow: Arc<F>,
    limits: ResourceLimits,
}

impl<F> WorkspaceService<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(uow: Arc<F>, limits: ResourceLimits) -> Self {
        Self { uow, limits }
    }

    /// Create a workspace for `owner_id`
    ///
    /// Fails with:
    /// - `NotFound` if the owner does not exist
    /// - `LimitExceeded` if the owner is at the workspace limit
    /// - `Conflict` if the owner already has a workspace with this name
    pub async fn create(
        &self,
        owner_id: &UserProfileId,
        new: NewWorkspace,
    ) -> Result<Workspace, DomainError> {
        let workspace = Workspace::new(*owner_id, new)?;
        let mut uow = self.uow.begin().await?;

        let owner = uow
            .user_profiles()
            .get(owner_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("UserProfile {}", owner_id)))?;

        let count = uow.user_profiles().count_workspaces(owner_id).await?;
        if !owner.can_create_workspace(count, self.limits.max_workspaces_per_user) {
            return Err(DomainError::LimitExceeded(format!(
                "User {} already owns the maximum of {} workspaces",
                owner_id, self.limits.max_workspaces_per_user
            )));
        }

        let existing = uow
            .workspaces()
            .get_by_user_and_name(owner_id, &workspace.name)
            .await?;
        if existing.is_some() {
            return Err(DomainError::Conflict(format!(
                "Workspace '{}' already exists for user {}",
                workspace.name, owner_id
            )));
        }

        let saved = uow.workspaces().save(&workspace).await?;
        uow.commit().await?;

        tracing::info!(
            workspace_id = %saved.id,
            owner_id = %owner_id,
            workspace_type = %saved.workspace_type,
            "Created workspace"
        );
        Ok(saved)
    }

    /// Get a workspace; when `owner_id` is given it must match the owner
    pub async fn get(
        &self,
        id: &WorkspaceId,
        owner_id: Option<&UserProfileId>,
    ) -> Result<Workspace, DomainError> {
        let uow = self.uow.begin().await?;
        let workspace = uow
            .workspaces()
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Workspace {}", id)))?;

        if let Some(owner_id) = owner_id {
            ensure_owner(&workspace, owner_id)?;
        }
        Ok(workspace)
    }

    /// A user's workspaces, oldest first, optionally of one type
    pub async fn list_for_user(
        &self,
        owner_id: &UserProfileId,
        workspace_type: Option<WorkspaceType>,
    ) -> Result<Vec<Workspace>, DomainError> {
        let uow = self.uow.begin().await?;
        if !uow.user_profiles().exists(owner_id).await? {
            return Err(DomainError::NotFound(format!("UserProfile {}", owner_id)));
        }

        let workspaces = match workspace_type {
            Some(t) => uow.workspaces().list_by_user_and_type(owner_id, t).await?,
            None => uow.workspaces().list_by_user(owner_id).await?,
        };
        Ok(workspaces)
    }

    pub async fn update(
        &self,
        id: &WorkspaceId,
        owner_id: &UserProfileId,
        update: WorkspaceUpdate,
    ) -> Result<Workspace, DomainError> {
        let mut uow = self.uow.begin().await?;
        let mut workspace = owned_workspace(&uow, id, owner_id).await?;

        if let Some(name) = update.name {
            if name != workspace.name {
                let clash = uow
                    .workspaces()
                    .get_by_user_and_name(owner_id, &name)
                    .await?;
                if clash.is_some() {
                    return Err(DomainError::Conflict(format!(
                        "Workspace '{}' already exists for user {}",
                        name, owner_id
                    )));
                }
                workspace.rename(&name)?;
            }
        }
        if let Some(description) = update.description {
            workspace.update_description(description);
        }
        if let Some(settings) = update.settings {
            workspace.update_settings(settings);
        }

        let saved = uow.workspaces().save(&workspace).await?;
        uow.commit().await?;

        tracing::info!(workspace_id = %saved.id, "Updated workspace");
        Ok(saved)
    }

    /// Delete a workspace with all of its repos and vaults.
    ///
    /// Everything happens in one scope. A locked vault aborts the delete
    /// with `Locked` and nothing is removed.
    pub async fn delete(
        &self,
        id: &WorkspaceId,
        owner_id: &UserProfileId,
    ) -> Result<ResourceCounts, DomainError> {
        let mut uow = self.uow.begin().await?;
        let workspace = owned_workspace(&uow, id, owner_id).await?;

        let repos = uow.repos().delete_by_workspace(&workspace.id).await?;

        let vaults = uow.vaults().list_by_workspace(&workspace.id).await?;
        for vault in &vaults {
            vault.ensure_unlocked()?;
            uow.vaults().delete(&vault.id).await?;
        }

        uow.workspaces().delete(&workspace.id).await?;
        uow.commit().await?;

        let removed = ResourceCounts {
            repos,
            vaults: vaults.len() as u64,
        };
        tracing::info!(
            workspace_id = %workspace.id,
            repos = removed.repos,
            vaults = removed.vaults,
            "Deleted workspace"
        );
        Ok(removed)
    }

    /// Repo and vault counts for a workspace
    pub async fn stats(
        &self,
        id: &WorkspaceId,
        owner_id: &UserProfileId,
    ) -> Result<ResourceCounts, DomainError> {
        let uow = self.uow.begin().await?;
        let workspace = owned_workspace(&uow, id, owner_id).await?;
        let counts = uow.workspaces().count_resources(&workspace.id).await?;
        Ok(counts)
    }

    pub async fn can_add_repo(&self, id: &WorkspaceId) -> Result<bool, DomainError> {
        let counts = self.counts(id).await?;
        Ok(counts.repos < self.limits.max_repos_per_workspace)
    }

    pub async fn can_add_vault(&self, id: &WorkspaceId) -> Result<bool, DomainError> {
        let counts = self.counts(id).await?;
        Ok(counts.vaults < self.limits.max_vaults_per_workspace)
    }

    /// Link a resource owned elsewhere (for example a global vault) to the workspace
    pub async fn share_resource(
        &self,
        id: &WorkspaceId,
        owner_id: &UserProfileId,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Workspace, DomainError> {
        if resource_type.trim().is_empty() {
            return Err(DomainError::Validation(
                "Resource type must not be empty".to_string(),
            ));
        }
        let mut uow = self.uow.begin().await?;
        let mut workspace = owned_workspace(&uow, id, owner_id).await?;

        workspace.add_shared_resource(resource_type, resource_id);
        let saved = uow.workspaces().save(&workspace).await?;
        uow.commit().await?;

        tracing::debug!(workspace_id = %saved.id, resource_type, %resource_id, "Shared resource");
        Ok(saved)
    }

    pub async fn unshare_resource(
        &self,
        id: &WorkspaceId,
        owner_id: &UserProfileId,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Workspace, DomainError> {
        let mut uow = self.uow.begin().await?;
        let mut workspace = owned_workspace(&uow, id, owner_id).await?;

        workspace.remove_shared_resource(resource_type, resource_id);
        let saved = uow.workspaces().save(&workspace).await?;
        uow.commit().await?;
        Ok(saved)
    }

    async fn counts(&self, id: &WorkspaceId) -> Result<ResourceCounts, DomainError> {
        let uow = self.uow.begin().await?;
        if !uow.workspaces().exists(id).await? {
            return Err(DomainError::NotFound(format!("Workspace {}", id)));
        }
        let counts = uow.workspaces().count_resources(id).await?;
        Ok(counts)
    }
}
