//! Schema bootstrap
//!
//! Tables are derived from the SeaORM entities, so the models in
//! `crate::entity` are the single source of truth for columns and foreign
//! keys. Every statement is idempotent.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Schema};

use crate::entity::{repos, user_profiles, vaults, workspaces};
use crate::error::DomainError;

/// Create all tables and indexes that do not exist yet
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DomainError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents before children so foreign keys resolve
    let tables = [
        schema.create_table_from_entity(user_profiles::Entity),
        schema.create_table_from_entity(workspaces::Entity),
        schema.create_table_from_entity(repos::Entity),
        schema.create_table_from_entity(vaults::Entity),
    ];
    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    let indexes = [
        Index::create()
            .name("uq_workspaces_owner_name")
            .table(workspaces::Entity)
            .col(workspaces::Column::OwnerId)
            .col(workspaces::Column::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_repos_workspace_id")
            .table(repos::Entity)
            .col(repos::Column::WorkspaceId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_vaults_workspace_id")
            .table(vaults::Entity)
            .col(vaults::Column::WorkspaceId)
            .if_not_exists()
            .to_owned(),
    ];
    for index in &indexes {
        db.execute(backend.build(index)).await?;
    }

    tracing::info!(backend = ?backend, "Database schema ready");
    Ok(())
}
