//! `SeaORM` Entity for the workspaces table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workspaces")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub workspace_type: String,
    pub settings: Json,
    pub shared_resources: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_profiles::Entity",
        from = "Column::OwnerId",
        to = "super::user_profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    UserProfiles,
    #[sea_orm(has_many = "super::repos::Entity")]
    Repos,
    #[sea_orm(has_many = "super::vaults::Entity")]
    Vaults,
}

impl Related<super::user_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserProfiles.def()
    }
}

impl Related<super::repos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repos.def()
    }
}

impl Related<super::vaults::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vaults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
