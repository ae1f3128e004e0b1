//! Application layer
//!
//! Contains use cases and service orchestration.
//! Each service operation runs inside exactly one unit of work: reads, checks
//! and the final write share a transaction, and nothing is applied unless the
//! whole operation succeeds.

use std::sync::Arc;

use crate::domain::ports::UnitOfWorkFactory;

mod access;
pub mod limits;
pub mod repo_service;
pub mod user_profile_service;
pub mod vault_service;
pub mod workspace_service;

pub use limits::{
    ResourceLimits, MAX_REPOS_PER_WORKSPACE, MAX_VAULTS_PER_WORKSPACE, MAX_WORKSPACES_PER_USER,
};
pub use repo_service::RepoService;
pub use user_profile_service::UserProfileService;
pub use vault_service::VaultService;
pub use workspace_service::WorkspaceService;

/// All services wired to one unit of work factory
pub struct Services<F>
where
    F: UnitOfWorkFactory,
{
    pub users: UserProfileService<F>,
    pub workspaces: WorkspaceService<F>,
    pub repos: RepoService<F>,
    pub vaults: VaultService<F>,
}

impl<F> Services<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(uow: Arc<F>, limits: ResourceLimits) -> Self {
        Self {
            users: UserProfileService::new(uow.clone(), limits),
            workspaces: WorkspaceService::new(uow.clone(), limits),
            repos: RepoService::new(uow.clone(), limits),
            vaults: VaultService::new(uow, limits),
        }
    }
}
