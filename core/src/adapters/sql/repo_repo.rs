//! SQL adapter for RepoRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::ScopedConnection;
use crate::domain::entities::{Repo, RepoFilter, RepoId, WorkspaceId};
use crate::domain::ports::{RepoRepository, Repository};
use crate::entity::repos;
use crate::error::DomainError;

/// SQL implementation of RepoRepository
pub struct SqlRepoRepository<'a, C> {
    scope: ScopedConnection<'a, C>,
}

impl<'a, C: ConnectionTrait> SqlRepoRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self::in_scope(ScopedConnection::new(conn))
    }

    pub(crate) fn in_scope(scope: ScopedConnection<'a, C>) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl<'a, C> Repository for SqlRepoRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    type Entity = Repo;
    type Id = RepoId;
    type Filter = RepoFilter;

    async fn get(&self, id: &RepoId) -> Result<Option<Repo>, DomainError> {
        let conn = self.scope.conn()?;
        let result = repos::Entity::find_by_id(id.0)
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, repo: &Repo) -> Result<Repo, DomainError> {
        repo.validate()?;
        let conn = self.scope.conn()?;

        repos::Entity::insert(to_active_model(repo))
            .on_conflict(
                OnConflict::column(repos::Column::Id)
                    .update_columns([
                        repos::Column::WorkspaceId,
                        repos::Column::Name,
                        repos::Column::Path,
                        repos::Column::RemoteUrl,
                        repos::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        self.get(&repo.id)
            .await?
            .ok_or_else(|| DomainError::Database(format!("Repo {} missing after save", repo.id)))
    }

    async fn delete(&self, id: &RepoId) -> Result<(), DomainError> {
        let conn = self.scope.conn()?;
        let result = repos::Entity::delete_by_id(id.0)
            .exec(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Repo {}", id)));
        }
        Ok(())
    }

    async fn exists(&self, id: &RepoId) -> Result<bool, DomainError> {
        let conn = self.scope.conn()?;
        let count = repos::Entity::find_by_id(id.0)
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(count > 0)
    }

    async fn list(&self, filter: &RepoFilter) -> Result<Vec<Repo>, DomainError> {
        let conn = self.scope.conn()?;
        let mut query = repos::Entity::find();
        if let Some(workspace_id) = filter.workspace_id {
            query = query.filter(repos::Column::WorkspaceId.eq(workspace_id.0));
        }
        if let Some(name) = &filter.name {
            query = query.filter(repos::Column::Name.eq(name.as_str()));
        }
        query = query
            .order_by_asc(repos::Column::CreatedAt)
            .order_by_asc(repos::Column::Id);
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
impl<'a, C> RepoRepository for SqlRepoRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    async fn list_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Repo>, DomainError> {
        self.list(&RepoFilter {
            workspace_id: Some(*workspace_id),
            ..Default::default()
        })
        .await
    }

    async fn get_by_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Repo>, DomainError> {
        let conn = self.scope.conn()?;
        let result = repos::Entity::find()
            .filter(repos::Column::WorkspaceId.eq(workspace_id.0))
            .filter(repos::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.map(Into::into))
    }

    async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError> {
        let conn = self.scope.conn()?;
        repos::Entity::find()
            .filter(repos::Column::WorkspaceId.eq(workspace_id.0))
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))
    }

    async fn delete_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError> {
        let conn = self.scope.conn()?;
        let result = repos::Entity::delete_many()
            .filter(repos::Column::WorkspaceId.eq(workspace_id.0))
            .exec(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.rows_affected)
    }
}

fn to_active_model(repo: &Repo) -> repos::ActiveModel {
    repos::ActiveModel {
        id: Set(repo.id.0),
        workspace_id: Set(repo.workspace_id.0),
        name: Set(repo.name.clone()),
        path: Set(repo.path.clone()),
        remote_url: Set(repo.remote_url.clone()),
        created_at: Set(repo.created_at.fixed_offset()),
        updated_at: Set(repo.updated_at.fixed_offset()),
    }
}

impl From<repos::Model> for Repo {
    fn from(model: repos::Model) -> Self {
        Repo {
            id: RepoId(model.id),
            workspace_id: WorkspaceId(model.workspace_id),
            name: model.name,
            path: model.path,
            remote_url: model.remote_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
