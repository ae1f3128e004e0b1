//! Unit of Work port
//!
//! A unit of work owns one transaction. Every repository handed out by a
//! scope writes through that transaction, and nothing is visible to other
//! scopes until `commit` succeeds.
//!
//! Dropping a scope without committing rolls it back. That covers early
//! returns via `?`, panics, and cancelled futures.

use async_trait::async_trait;

use super::repositories::{
    RepoRepository, UserProfileRepository, VaultRepository, WorkspaceRepository,
};
use crate::error::DomainError;

/// A transactional scope binding all repositories to one transaction
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type UserProfiles<'a>: UserProfileRepository + 'a
    where
        Self: 'a;
    type Workspaces<'a>: WorkspaceRepository + 'a
    where
        Self: 'a;
    type Repos<'a>: RepoRepository + 'a
    where
        Self: 'a;
    type Vaults<'a>: VaultRepository + 'a
    where
        Self: 'a;

    fn user_profiles(&self) -> Self::UserProfiles<'_>;

    fn workspaces(&self) -> Self::Workspaces<'_>;

    fn repos(&self) -> Self::Repos<'_>;

    fn vaults(&self) -> Self::Vaults<'_>;

    /// Apply every write made through this scope.
    ///
    /// Succeeds at most once. A second call, a call after `rollback`, or a
    /// call after any storage error inside the scope fails with
    /// `IllegalState`. A uniqueness violation surfacing at commit is
    /// `Conflict`.
    async fn commit(&mut self) -> Result<(), DomainError>;

    /// Discard every write made through this scope. Idempotent.
    async fn rollback(&mut self) -> Result<(), DomainError>;
}

/// Opens units of work; one per business operation
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    type Scope: UnitOfWork;

    /// Start a new transactional scope
    async fn begin(&self) -> Result<Self::Scope, DomainError>;
}
