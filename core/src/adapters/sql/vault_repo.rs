//! SQL adapter for VaultRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::ScopedConnection;
use crate::domain::entities::{now, Vault, VaultFilter, VaultId, WorkspaceId};
use crate::domain::ports::{Repository, VaultRepository};
use crate::entity::vaults;
use crate::error::DomainError;

/// SQL implementation of VaultRepository
pub struct SqlVaultRepository<'a, C> {
    scope: ScopedConnection<'a, C>,
}

impl<'a, C: ConnectionTrait> SqlVaultRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self::in_scope(ScopedConnection::new(conn))
    }

    pub(crate) fn in_scope(scope: ScopedConnection<'a, C>) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl<'a, C> Repository for SqlVaultRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    type Entity = Vault;
    type Id = VaultId;
    type Filter = VaultFilter;

    async fn get(&self, id: &VaultId) -> Result<Option<Vault>, DomainError> {
        let conn = self.scope.conn()?;
        let result = vaults::Entity::find_by_id(id.0)
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.map(Into::into))
    }

    /// `is_locked` is written on insert only; an existing row keeps its flag
    async fn save(&self, vault: &Vault) -> Result<Vault, DomainError> {
        vault.validate()?;
        let conn = self.scope.conn()?;

        vaults::Entity::insert(to_active_model(vault))
            .on_conflict(
                OnConflict::column(vaults::Column::Id)
                    .update_columns([
                        vaults::Column::WorkspaceId,
                        vaults::Column::Name,
                        vaults::Column::Path,
                        vaults::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        self.get(&vault.id).await?.ok_or_else(|| {
            DomainError::Database(format!("Vault {} missing after save", vault.id))
        })
    }

    async fn delete(&self, id: &VaultId) -> Result<(), DomainError> {
        let conn = self.scope.conn()?;
        let result = vaults::Entity::delete_by_id(id.0)
            .exec(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Vault {}", id)));
        }
        Ok(())
    }

    async fn exists(&self, id: &VaultId) -> Result<bool, DomainError> {
        let conn = self.scope.conn()?;
        let count = vaults::Entity::find_by_id(id.0)
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(count > 0)
    }

    async fn list(&self, filter: &VaultFilter) -> Result<Vec<Vault>, DomainError> {
        let conn = self.scope.conn()?;
        let mut query = vaults::Entity::find();
        if let Some(workspace_id) = filter.workspace_id {
            query = query.filter(vaults::Column::WorkspaceId.eq(workspace_id.0));
        }
        if let Some(name) = &filter.name {
            query = query.filter(vaults::Column::Name.eq(name.as_str()));
        }
        if let Some(is_locked) = filter.is_locked {
            query = query.filter(vaults::Column::IsLocked.eq(is_locked));
        }
        query = query
            .order_by_asc(vaults::Column::CreatedAt)
            .order_by_asc(vaults::Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }
        let results = query.all(conn).await.map_err(|e| self.scope.fail(e))?;

        Ok(results.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl<'a, C> VaultRepository for SqlVaultRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    async fn list_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Vault>, DomainError> {
        self.list(&VaultFilter {
            workspace_id: Some(*workspace_id),
            ..Default::default()
        })
        .await
    }

    async fn get_by_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Vault>, DomainError> {
        let conn = self.scope.conn()?;
        let result = vaults::Entity::find()
            .filter(vaults::Column::WorkspaceId.eq(workspace_id.0))
            .filter(vaults::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.map(Into::into))
    }

    async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError> {
        let conn = self.scope.conn()?;
        vaults::Entity::find()
            .filter(vaults::Column::WorkspaceId.eq(workspace_id.0))
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))
    }

    async fn set_locked(&self, id: &VaultId, locked: bool) -> Result<Vault, DomainError> {
        let conn = self.scope.conn()?;
        let result = vaults::Entity::update_many()
            .col_expr(vaults::Column::IsLocked, Expr::value(locked))
            .col_expr(vaults::Column::UpdatedAt, Expr::value(now().fixed_offset()))
            .filter(vaults::Column::Id.eq(id.0))
            .exec(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Vault {}", id)));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Vault {}", id)))
    }
}

fn to_active_model(vault: &Vault) -> vaults::ActiveModel {
    vaults::ActiveModel {
        id: Set(vault.id.0),
        workspace_id: Set(vault.workspace_id.0),
        name: Set(vault.name.clone()),
        path: Set(vault.path.clone()),
        is_locked: Set(vault.is_locked),
        created_at: Set(vault.created_at.fixed_offset()),
        updated_at: Set(vault.updated_at.fixed_offset()),
    }
}

impl From<vaults::Model> for Vault {
    fn from(model: vaults::Model) -> Self {
        Vault {
            id: VaultId(model.id),
            workspace_id: WorkspaceId(model.workspace_id),
            name: model.name,
            path: model.path,
            is_locked: model.is_locked,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
