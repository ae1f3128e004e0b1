//! SQL adapters
//!
//! Implementations of the repository ports and the unit of work on top of
//! SeaORM. PostgreSQL is the production backend; SQLite backs demo mode and
//! the tests below.

pub mod connection;
pub mod repo_repo;
pub mod schema;
pub mod unit_of_work;
pub mod user_profile_repo;
pub mod vault_repo;
pub mod workspace_repo;


use std::sync::atomic::{AtomicBool, Ordering};

use sea_orm::{ConnectionTrait, DbErr};
use serde_json::{Map, Value};

use crate::error::DomainError;

pub use connection::connect;
pub use repo_repo::SqlRepoRepository;
pub use schema::create_schema;
pub use unit_of_work::{SqlUnitOfWork, SqlUnitOfWorkFactory};
pub use user_profile_repo::SqlUserProfileRepository;
pub use vault_repo::SqlVaultRepository;
pub use workspace_repo::SqlWorkspaceRepository;

/// The connection a repository runs its statements on.
///
/// Repositories handed out by a unit of work share the scope's transaction
/// and its failure flag. Once the scope is closed the connection is gone and
/// every call fails with `IllegalState`.
pub struct ScopedConnection<'a, C> {
    conn: Option<&'a C>,
    failed: Option<&'a AtomicBool>,
}

impl<C> Clone for ScopedConnection<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ScopedConnection<'_, C> {}

impl<'a, C: ConnectionTrait> ScopedConnection<'a, C> {
    /// Run statements directly on a connection, outside any unit of work
    pub fn new(conn: &'a C) -> Self {
        Self {
            conn: Some(conn),
            failed: None,
        }
    }

    pub(crate) fn scoped(conn: Option<&'a C>, failed: &'a AtomicBool) -> Self {
        Self {
            conn,
            failed: Some(failed),
        }
    }

    pub(crate) fn conn(&self) -> Result<&'a C, DomainError> {
        self.conn.ok_or_else(|| {
            DomainError::IllegalState("Unit of work is already closed".to_string())
        })
    }

    /// Classify a storage error and poison the surrounding scope
    pub(crate) fn fail(&self, err: DbErr) -> DomainError {
        if let Some(failed) = self.failed {
            failed.store(true, Ordering::SeqCst);
        }
        let err = DomainError::from(err);
        tracing::warn!(error = %err, "Storage operation failed");
        err
    }
}

/// Unwrap a JSON column that should hold an object
pub(crate) fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
