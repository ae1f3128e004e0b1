//! Lookups shared by the services that enforce workspace ownership

use crate::domain::entities::{UserProfileId, Workspace, WorkspaceId};
use crate::domain::ports::{Repository, UnitOfWork};
use crate::error::DomainError;

/// Load a workspace and check that `owner_id` owns it
pub(crate) async fn owned_workspace<U: UnitOfWork>(
    uow: &U,
    workspace_id: &WorkspaceId,
    owner_id: &UserProfileId,
) -> Result<Workspace, DomainError> {
    let workspace = uow
        .workspaces()
        .get(workspace_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Workspace {}", workspace_id)))?;

    ensure_owner(&workspace, owner_id)?;
    Ok(workspace)
}

pub(crate) fn ensure_owner(
    workspace: &Workspace,
    owner_id: &UserProfileId,
) -> Result<(), DomainError> {
    if !workspace.is_owned_by(owner_id) {
        return Err(DomainError::Forbidden(format!(
            "Workspace {} is not owned by user {}",
            workspace.id, owner_id
        )));
    }
    Ok(())
}
