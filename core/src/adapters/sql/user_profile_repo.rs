//! SQL adapter for UserProfileRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value;

use super::{json_object, ScopedConnection};
use crate::domain::entities::{UserProfile, UserProfileFilter, UserProfileId};
use crate::domain::ports::{Repository, UserProfileRepository};
use crate::entity::{user_profiles, workspaces};
use crate::error::DomainError;

/// SQL implementation of UserProfileRepository
pub struct SqlUserProfileRepository<'a, C> {
    scope: ScopedConnection<'a, C>,
}

impl<'a, C: ConnectionTrait> SqlUserProfileRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self::in_scope(ScopedConnection::new(conn))
    }

    pub(crate) fn in_scope(scope: ScopedConnection<'a, C>) -> Self {
        Self { scope }
    }

    async fn find_one_by(
        &self,
        column: user_profiles::Column,
        value: &str,
    ) -> Result<Option<UserProfile>, DomainError> {
        let conn = self.scope.conn()?;
        let result = user_profiles::Entity::find()
            .filter(column.eq(value))
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.map(Into::into))
    }

    async fn is_taken(
        &self,
        column: user_profiles::Column,
        value: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError> {
        let conn = self.scope.conn()?;
        let mut query = user_profiles::Entity::find().filter(column.eq(value));
        if let Some(id) = exclude_id {
            query = query.filter(user_profiles::Column::Id.ne(id.0));
        }
        let count = query.count(conn).await.map_err(|e| self.scope.fail(e))?;

        Ok(count > 0)
    }
}

#[async_trait]
impl<'a, C> Repository for SqlUserProfileRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    type Entity = UserProfile;
    type Id = UserProfileId;
    type Filter = UserProfileFilter;

    async fn get(&self, id: &UserProfileId) -> Result<Option<UserProfile>, DomainError> {
        let conn = self.scope.conn()?;
        let result = user_profiles::Entity::find_by_id(id.0)
            .one(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, DomainError> {
        profile.validate()?;
        let conn = self.scope.conn()?;

        user_profiles::Entity::insert(to_active_model(profile))
            .on_conflict(
                OnConflict::column(user_profiles::Column::Id)
                    .update_columns([
                        user_profiles::Column::Username,
                        user_profiles::Column::Email,
                        user_profiles::Column::Preferences,
                        user_profiles::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        self.get(&profile.id).await?.ok_or_else(|| {
            DomainError::Database(format!("UserProfile {} missing after save", profile.id))
        })
    }

    /// Refused with `Conflict` while the profile still owns workspaces
    async fn delete(&self, id: &UserProfileId) -> Result<(), DomainError> {
        if self.count_workspaces(id).await? > 0 {
            return Err(DomainError::Conflict(format!(
                "UserProfile {} still owns workspaces",
                id
            )));
        }
        let conn = self.scope.conn()?;
        let result = user_profiles::Entity::delete_by_id(id.0)
            .exec(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("UserProfile {}", id)));
        }
        Ok(())
    }

    async fn exists(&self, id: &UserProfileId) -> Result<bool, DomainError> {
        let conn = self.scope.conn()?;
        let count = user_profiles::Entity::find_by_id(id.0)
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))?;

        Ok(count > 0)
    }

    async fn list(&self, filter: &UserProfileFilter) -> Result<Vec<UserProfile>, DomainError> {
        let conn = self.scope.conn()?;
        let mut query = user_profiles::Entity::find()
            .order_by_asc(user_profiles::Column::CreatedAt)
            .order_by_asc(user_profiles::Column::Id);
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
impl<'a, C> UserProfileRepository for SqlUserProfileRepository<'a, C>
where
    C: ConnectionTrait + 'a,
{
    async fn get_by_username(&self, username: &str) -> Result<Option<UserProfile>, DomainError> {
        self.find_one_by(user_profiles::Column::Username, username)
            .await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserProfile>, DomainError> {
        self.find_one_by(user_profiles::Column::Email, email).await
    }

    async fn exists_by_username(
        &self,
        username: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError> {
        self.is_taken(user_profiles::Column::Username, username, exclude_id)
            .await
    }

    async fn exists_by_email(
        &self,
        email: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError> {
        self.is_taken(user_profiles::Column::Email, email, exclude_id)
            .await
    }

    async fn count_workspaces(&self, user_id: &UserProfileId) -> Result<u64, DomainError> {
        let conn = self.scope.conn()?;
        workspaces::Entity::find()
            .filter(workspaces::Column::OwnerId.eq(user_id.0))
            .count(conn)
            .await
            .map_err(|e| self.scope.fail(e))
    }
}

fn to_active_model(profile: &UserProfile) -> user_profiles::ActiveModel {
    user_profiles::ActiveModel {
        id: Set(profile.id.0),
        username: Set(profile.username.clone()),
        email: Set(profile.email.clone()),
        preferences: Set(Value::Object(profile.preferences.clone())),
        created_at: Set(profile.created_at.fixed_offset()),
        updated_at: Set(profile.updated_at.fixed_offset()),
    }
}

impl From<user_profiles::Model> for UserProfile {
    fn from(model: user_profiles::Model) -> Self {
        UserProfile {
            id: UserProfileId(model.id),
            username: model.username,
            email: model.email,
            preferences: json_object(model.preferences),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
