//! Vault service
//!
//! Tracks document vaults inside a workspace. A locked vault can only be
//! unlocked; updates and deletes fail with `Locked` until then.

use std::sync::Arc;

use crate::app::access::{ensure_owner, owned_workspace};
use crate::app::ResourceLimits;
use crate::domain::entities::{NewVault, UserProfileId, Vault, VaultId, VaultUpdate, WorkspaceId};
use crate::domain::ports::{Repository, UnitOfWork, UnitOfWorkFactory, VaultRepository};
use crate::error::DomainError;

/// Service for managing vaults
pub struct VaultService<F>
where
    F: UnitOfWorkFactory,
{
    uow: Arc<F>,
    limits: ResourceLimits,
}

impl<F> VaultService<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(uow: Arc<F>, limits: ResourceLimits) -> Self {
        Self { uow, limits }
    }

    /// Add a vault to a workspace; new vaults start unlocked
    pub async fn create(
        &self,
        workspace_id: &WorkspaceId,
        owner_id: &UserProfileId,
        new: NewVault,
    ) -> Result<Vault, DomainError> {
        let vault = Vault::new(*workspace_id, new)?;
        let mut uow = self.uow.begin().await?;
        owned_workspace(&uow, workspace_id, owner_id).await?;

        let count = uow.vaults().count_by_workspace(workspace_id).await?;
        if count >= self.limits.max_vaults_per_workspace {
            return Err(DomainError::LimitExceeded(format!(
                "Workspace {} already holds the maximum of {} vaults",
                workspace_id, self.limits.max_vaults_per_workspace
            )));
        }

        let existing = uow.vaults().get_by_name(workspace_id, &vault.name).await?;
        if existing.is_some() {
            return Err(DomainError::Conflict(format!(
                "Vault '{}' already exists in workspace {}",
                vault.name, workspace_id
            )));
        }

        let saved = uow.vaults().save(&vault).await?;
        uow.commit().await?;

        tracing::info!(
            vault_id = %saved.id,
            workspace_id = %workspace_id,
            name = %saved.name,
            "Added vault"
        );
        Ok(saved)
    }

    pub async fn get(
        &self,
        id: &VaultId,
        owner_id: Option<&UserProfileId>,
    ) -> Result<Vault, DomainError> {
        let uow = self.uow.begin().await?;
        let vault = match owner_id {
            Some(owner_id) => owned_vault(&uow, id, owner_id).await?,
            None => find(&uow, id).await?,
        };
        Ok(vault)
    }

    pub async fn list(
        &self,
        workspace_id: &WorkspaceId,
        owner_id: &UserProfileId,
    ) -> Result<Vec<Vault>, DomainError> {
        let uow = self.uow.begin().await?;
        owned_workspace(&uow, workspace_id, owner_id).await?;
        let vaults = uow.vaults().list_by_workspace(workspace_id).await?;
        Ok(vaults)
    }

    pub async fn update(
        &self,
        id: &VaultId,
        owner_id: &UserProfileId,
        update: VaultUpdate,
    ) -> Result<Vault, DomainError> {
        let mut uow = self.uow.begin().await?;
        let mut vault = owned_vault(&uow, id, owner_id).await?;
        vault.ensure_unlocked()?;

        if let Some(name) = update.name {
            if name != vault.name {
                let clash = uow.vaults().get_by_name(&vault.workspace_id, &name).await?;
                if clash.is_some() {
                    return Err(DomainError::Conflict(format!(
                        "Vault '{}' already exists in workspace {}",
                        name, vault.workspace_id
                    )));
                }
                vault.rename(&name)?;
            }
        }
        if let Some(path) = update.path {
            vault.update_path(&path)?;
        }

        let saved = uow.vaults().save(&vault).await?;
        uow.commit().await?;

        tracing::info!(vault_id = %saved.id, "Updated vault");
        Ok(saved)
    }

    pub async fn delete(&self, id: &VaultId, owner_id: &UserProfileId) -> Result<(), DomainError> {
        let mut uow = self.uow.begin().await?;
        let vault = owned_vault(&uow, id, owner_id).await?;
        vault.ensure_unlocked()?;

        uow.vaults().delete(&vault.id).await?;
        uow.commit().await?;

        tracing::info!(vault_id = %vault.id, workspace_id = %vault.workspace_id, "Deleted vault");
        Ok(())
    }

    /// Lock a vault; `Conflict` if it is already locked
    pub async fn lock(&self, id: &VaultId, owner_id: &UserProfileId) -> Result<Vault, DomainError> {
        self.set_locked(id, owner_id, true).await
    }

    /// Unlock a vault; `Conflict` if it is not locked
    pub async fn unlock(
        &self,
        id: &VaultId,
        owner_id: &UserProfileId,
    ) -> Result<Vault, DomainError> {
        self.set_locked(id, owner_id, false).await
    }

    async fn set_locked(
        &self,
        id: &VaultId,
        owner_id: &UserProfileId,
        locked: bool,
    ) -> Result<Vault, DomainError> {
        let mut uow = self.uow.begin().await?;
        let mut vault = owned_vault(&uow, id, owner_id).await?;
        if locked {
            vault.lock()?;
        } else {
            vault.unlock()?;
        }

        let saved = uow.vaults().set_locked(&vault.id, locked).await?;
        uow.commit().await?;

        tracing::info!(vault_id = %saved.id, locked, "Changed vault lock");
        Ok(saved)
    }
}

async fn find<U: UnitOfWork>(uow: &U, id: &VaultId) -> Result<Vault, DomainError> {
    uow.vaults()
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Vault {}", id)))
}

async fn owned_vault<U: UnitOfWork>(
    uow: &U,
    id: &VaultId,
    owner_id: &UserProfileId,
) -> Result<Vault, DomainError> {
    let vault = find(uow, id).await?;
    let workspace = uow
        .workspaces()
        .get(&vault.workspace_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Workspace {}", vault.workspace_id)))?;
    ensure_owner(&workspace, owner_id)?;
    Ok(vault)
}
