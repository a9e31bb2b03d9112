//! SeaORM Entity for the esp_keys table.
//! One row per stored ESP API key; a user may hold any number of keys per provider.

use crate::provider::Provider;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::esp_keys::Model)]
#[sea_orm(schema_name = "audience_platform", table_name = "esp_keys")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,

    /// The user who stored the key
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Id,

    pub provider: Provider,

    /// Display label; auto-assigned at creation when the caller supplies none
    pub name: String,

    /// The raw provider API key. Write-only at the HTTP boundary: it is
    /// accepted on create and handed to gateway clients, but never serialized
    /// back to any client.
    #[serde(skip_serializing)]
    pub secret_key: String,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
