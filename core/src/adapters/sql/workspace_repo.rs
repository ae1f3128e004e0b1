//! SQL adapter for WorkspaceRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value;

use super::{json_object, ScopedConnection};
use crate::domain::entities::{
    ResourceCounts, UserProfileId, Workspace, WorkspaceFilter, WorkspaceId, WorkspaceType,
};
use crate::domain::ports::{Repository, WorkspaceRepository};
use crate::entity::{repos, vaults, workspaces};
use crate::error::DomainError;

/// SQL implementation of WorkspaceRepository
pub struct SqlWorkspaceRepository<'a, C> {
    scope: ScopedConnection<'a, C>,
}

impl<'a, C: ConnectionTrait> SqlWorkspaceRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self::in_scope(ScopedConnection::new(conn))
    }

    pub(crate) fn in_scope(scope: ScopedConnection<'a, C>) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl<'a, C> Repository for SqlWorkspaceRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    type Entity = Workspace;
    type Id = WorkspaceId;
    type Filter = WorkspaceFilter;

    async fn get(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DomainError> {
        let conn = self.scope.conn()?;
        let result = workspaces::Entity::find_by_id(id.0)
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        result.map(Workspace::try_from).transpose()
    }

    async fn save(&self, workspace: &Workspace) -> Result<Workspace, DomainError> {
        workspace.validate()?;
        let conn = self.scope.conn()?;

        workspaces::Entity::insert(to_active_model(workspace)?)
            .on_conflict(
                OnConflict::column(workspaces::Column::Id)
                    .update_columns([
                        workspaces::Column::OwnerId,
                        workspaces::Column::Name,
                        workspaces::Column::Description,
                        workspaces::Column::WorkspaceType,
                        workspaces::Column::Settings,
                        workspaces::Column::SharedResources,
                        workspaces::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        self.get(&workspace.id).await?.ok_or_else(|| {
            DomainError::Database(format!("Workspace {} missing after save", workspace.id))
        })
    }

    async fn delete(&self, id: &WorkspaceId) -> Result<(), DomainError> {
        let conn = self.scope.conn()?;
        let result = workspaces::Entity::delete_by_id(id.0)
            .exec(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Workspace {}", id)));
        }
        Ok(())
    }

    async fn exists(&self, id: &WorkspaceId) -> Result<bool, DomainError> {
        let conn = self.scope.conn()?;
        let count = workspaces::Entity::find_by_id(id.0)
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(count > 0)
    }

    async fn list(&self, filter: &WorkspaceFilter) -> Result<Vec<Workspace>, DomainError> {
        let conn = self.scope.conn()?;
        let mut query = workspaces::Entity::find();
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(workspaces::Column::OwnerId.eq(owner_id.0));
        }
        if let Some(workspace_type) = filter.workspace_type {
            query = query.filter(workspaces::Column::WorkspaceType.eq(workspace_type.to_string()));
        }
        query = query
            .order_by_asc(workspaces::Column::CreatedAt)
            .order_by_asc(workspaces::Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }
        let results = query.all(conn).await.map_err(|e| self.scope.fail(e))?;

        results.into_iter().map(Workspace::try_from).collect()
    }
}

#[async_trait]
impl<'a, C> WorkspaceRepository for SqlWorkspaceRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    async fn get_by_user_and_name(
        &self,
        user_id: &UserProfileId,
        name: &str,
    ) -> Result<Option<Workspace>, DomainError> {
        let conn = self.scope.conn()?;
        let result = workspaces::Entity::find()
            .filter(workspaces::Column::OwnerId.eq(user_id.0))
            .filter(workspaces::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        result.map(Workspace::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: &UserProfileId) -> Result<Vec<Workspace>, DomainError> {
        self.list(&WorkspaceFilter {
            owner_id: Some(*user_id),
            ..Default::default()
        })
        .await
    }

    async fn list_by_user_and_type(
        &self,
        user_id: &UserProfileId,
        workspace_type: WorkspaceType,
    ) -> Result<Vec<Workspace>, DomainError> {
        self.list(&WorkspaceFilter {
            owner_id: Some(*user_id),
            workspace_type: Some(workspace_type),
            ..Default::default()
        })
        .await
    }

    async fn count_resources(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<ResourceCounts, DomainError> {
        let conn = self.scope.conn()?;
        let repos = repos::Entity::find()
            .filter(repos::Column::WorkspaceId.eq(workspace_id.0))
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;
        let vaults = vaults::Entity::find()
            .filter(vaults::Column::WorkspaceId.eq(workspace_id.0))
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(ResourceCounts { repos, vaults })
    }
}

fn to_active_model(workspace: &Workspace) -> Result<workspaces::ActiveModel, DomainError> {
    let shared_resources = serde_json::to_value(&workspace.shared_resources).map_err(|e| {
        DomainError::Validation(format!("Unserializable shared resources: {}", e))
    })?;

    Ok(workspaces::ActiveModel {
        id: Set(workspace.id.0),
        owner_id: Set(workspace.owner_id.0),
        name: Set(workspace.name.clone()),
        description: Set(workspace.description.clone()),
        workspace_type: Set(workspace.workspace_type.to_string()),
        settings: Set(Value::Object(workspace.settings.clone())),
        shared_resources: Set(shared_resources),
        created_at: Set(workspace.created_at.fixed_offset()),
        updated_at: Set(workspace.updated_at.fixed_offset()),
    })
}

/// A row whose type or shared resources fail to parse is a `Database` error
impl TryFrom<workspaces::Model> for Workspace {
    type Error = DomainError;

    fn try_from(model: workspaces::Model) -> Result<Self, Self::Error> {
        let workspace_type = model.workspace_type.parse().map_err(|_| {
            DomainError::Database(format!(
                "Workspace {} has unknown type '{}'",
                model.id, model.workspace_type
            ))
        })?;
        let shared_resources = serde_json::from_value(model.shared_resources).map_err(|e| {
            DomainError::Database(format!(
                "Workspace {} has malformed shared resources: {}",
                model.id, e
            ))
        })?;

        Ok(Workspace {
            id: WorkspaceId(model.id),
            owner_id: UserProfileId(model.owner_id),
            name: model.name,
            description: model.description,
            workspace_type,
            settings: json_object(model.settings),
            shared_resources,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
