//! Repo service
//!
//! Tracks code repositories inside a workspace. Every operation checks that
//! the caller owns the workspace.

use std::sync::Arc;

use crate::app::access::{ensure_owner, owned_workspace};
use crate::app::ResourceLimits;
use crate::domain::entities::{NewRepo, Repo, RepoId, RepoUpdate, UserProfileId, WorkspaceId};
use crate::domain::ports::{RepoRepository, Repository, UnitOfWork, UnitOfWorkFactory};
use crate::error::DomainError;

/// Service for managing repos
pub struct RepoService<F>
where
    F: UnitOfWorkFactory,
{
    uow: Arc<F>,
    limits: ResourceLimits,
}

impl<F> RepoService<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(uow: Arc<F>, limits: ResourceLimits) -> Self {
        Self { uow, limits }
    }

    /// Add a repo to a workspace
    ///
    /// Fails with `NotFound` for a missing workspace, `Forbidden` when
    /// `owner_id` does not own it, `LimitExceeded` once the workspace holds
    /// the maximum number of repos and `Conflict` on a duplicate name.
    pub async fn create(
        &self,
        workspace_id: &WorkspaceId,
        owner_id: &UserProfileId,
        new: NewRepo,
    ) -> Result<Repo, DomainError> {
        let repo = Repo::new(*workspace_id, new)?;
        let mut uow = self.uow.begin().await?;
        owned_workspace(&uow, workspace_id, owner_id).await?;

        let count = uow.repos().count_by_workspace(workspace_id).await?;
        if count >= self.limits.max_repos_per_workspace {
            return Err(DomainError::LimitExceeded(format!(
                "Workspace {} already holds the maximum of {} repos",
                workspace_id, self.limits.max_repos_per_workspace
            )));
        }

        let existing = uow.repos().get_by_name(workspace_id, &repo.name).await?;
        if existing.is_some() {
            return Err(DomainError::Conflict(format!(
                "Repo '{}' already exists in workspace {}",
                repo.name, workspace_id
            )));
        }

        let saved = uow.repos().save(&repo).await?;
        uow.commit().await?;

        tracing::info!(
            repo_id = %saved.id,
            workspace_id = %workspace_id,
            name = %saved.name,
            "Added repo"
        );
        Ok(saved)
    }

    /// Get a repo; when `owner_id` is given it must own the repo's workspace
    pub async fn get(
        &self,
        id: &RepoId,
        owner_id: Option<&UserProfileId>,
    ) -> Result<Repo, DomainError> {
        let uow = self.uow.begin().await?;
        let repo = match owner_id {
            Some(owner_id) => owned_repo(&uow, id, owner_id).await?,
            None => find(&uow, id).await?,
        };
        Ok(repo)
    }

    pub async fn list(
        &self,
        workspace_id: &WorkspaceId,
        owner_id: &UserProfileId,
    ) -> Result<Vec<Repo>, DomainError> {
        let uow = self.uow.begin().await?;
        owned_workspace(&uow, workspace_id, owner_id).await?;
        let repos = uow.repos().list_by_workspace(workspace_id).await?;
        Ok(repos)
    }

    pub async fn update(
        &self,
        id: &RepoId,
        owner_id: &UserProfileId,
        update: RepoUpdate,
    ) -> Result<Repo, DomainError> {
        let mut uow = self.uow.begin().await?;
        let mut repo = owned_repo(&uow, id, owner_id).await?;

        if let Some(name) = update.name {
            if name != repo.name {
                let clash = uow.repos().get_by_name(&repo.workspace_id, &name).await?;
                if clash.is_some() {
                    return Err(DomainError::Conflict(format!(
                        "Repo '{}' already exists in workspace {}",
                        name, repo.workspace_id
                    )));
                }
                repo.rename(&name)?;
            }
        }
        if let Some(path) = update.path {
            repo.update_path(&path)?;
        }
        if let Some(remote_url) = update.remote_url {
            repo.update_remote_url(remote_url)?;
        }

        let saved = uow.repos().save(&repo).await?;
        uow.commit().await?;

        tracing::info!(repo_id = %saved.id, "Updated repo");
        Ok(saved)
    }

    pub async fn delete(&self, id: &RepoId, owner_id: &UserProfileId) -> Result<(), DomainError> {
        let mut uow = self.uow.begin().await?;
        let repo = owned_repo(&uow, id, owner_id).await?;

        uow.repos().delete(&repo.id).await?;
        uow.commit().await?;

        tracing::info!(repo_id = %repo.id, workspace_id = %repo.workspace_id, "Deleted repo");
        Ok(())
    }
}

async fn find<U: UnitOfWork>(uow: &U, id: &RepoId) -> Result<Repo, DomainError> {
    uow.repos()
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Repo {}", id)))
}

async fn owned_repo<U: UnitOfWork>(
    uow: &U,
    id: &RepoId,
    owner_id: &UserProfileId,
) -> Result<Repo, DomainError> {
    let repo = find(uow, id).await?;
    let workspace = uow
        .workspaces()
        .get(&repo.workspace_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Workspace {}", repo.workspace_id)))?;
    ensure_owner(&workspace, owner_id)?;
    Ok(repo)
}
