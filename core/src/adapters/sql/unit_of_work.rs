//! SQL unit of work
//!
//! Each scope owns one `DatabaseTransaction`. Repositories borrow it, so
//! every read and write made through a scope sees the scope's own changes
//! and nothing else sees them until commit.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use super::{
    ScopedConnection, SqlRepoRepository, SqlUserProfileRepository, SqlVaultRepository,
    SqlWorkspaceRepository,
};
use crate::domain::ports::{UnitOfWork, UnitOfWorkFactory};
use crate::error::DomainError;

/// A unit of work backed by a single database transaction
pub struct SqlUnitOfWork {
    txn: Option<DatabaseTransaction>,
    failed: AtomicBool,
    committed: bool,
}

impl SqlUnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, DomainError> {
        let txn = db.begin().await?;
        tracing::debug!("Unit of work started");

        Ok(Self {
            txn: Some(txn),
            failed: AtomicBool::new(false),
            committed: false,
        })
    }

    fn scope(&self) -> ScopedConnection<'_, DatabaseTransaction> {
        ScopedConnection::scoped(self.txn.as_ref(), &self.failed)
    }

    fn closed_error(&self) -> DomainError {
        if self.committed {
            DomainError::IllegalState("Unit of work already committed".to_string())
        } else {
            DomainError::IllegalState("Unit of work already rolled back".to_string())
        }
    }
}

#[async_trait]
impl UnitOfWork for SqlUnitOfWork {
    type UserProfiles<'a> = SqlUserProfileRepository<'a, DatabaseTransaction>;
    type Workspaces<'a> = SqlWorkspaceRepository<'a, DatabaseTransaction>;
    type Repos<'a> = SqlRepoRepository<'a, DatabaseTransaction>;
    type Vaults<'a> = SqlVaultRepository<'a, DatabaseTransaction>;

    fn user_profiles(&self) -> Self::UserProfiles<'_> {
        SqlUserProfileRepository::in_scope(self.scope())
    }

    fn workspaces(&self) -> Self::Workspaces<'_> {
        SqlWorkspaceRepository::in_scope(self.scope())
    }

    fn repos(&self) -> Self::Repos<'_> {
        SqlRepoRepository::in_scope(self.scope())
    }

    fn vaults(&self) -> Self::Vaults<'_> {
        SqlVaultRepository::in_scope(self.scope())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let Some(txn) = self.txn.take() else {
            return Err(self.closed_error());
        };

        if self.failed.load(Ordering::SeqCst) {
            if let Err(e) = txn.rollback().await {
                tracing::warn!(error = %e, "Rollback of failed unit of work errored");
            }
            return Err(DomainError::IllegalState(
                "Cannot commit after a failed operation; changes were rolled back".to_string(),
            ));
        }

        txn.commit().await.map_err(|e| {
            let err = DomainError::from(e);
            tracing::warn!(error = %err, "Commit failed");
            err
        })?;
        self.committed = true;
        tracing::debug!("Unit of work committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DomainError> {
        if let Some(txn) = self.txn.take() {
            txn.rollback().await?;
            tracing::debug!("Unit of work rolled back");
        }
        Ok(())
    }
}

impl Drop for SqlUnitOfWork {
    fn drop(&mut self) {
        // The transaction rolls itself back when dropped
        if self.txn.is_some() {
            tracing::debug!("Unit of work dropped without commit, rolling back");
        }
    }
}

/// Opens a transaction per business operation
#[derive(Clone)]
pub struct SqlUnitOfWorkFactory {
    db: DatabaseConnection,
}

impl SqlUnitOfWorkFactory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UnitOfWorkFactory for SqlUnitOfWorkFactory {
    type Scope = SqlUnitOfWork;

    async fn begin(&self) -> Result<SqlUnitOfWork, DomainError> {
        SqlUnitOfWork::begin(&self.db).await
    }
}
